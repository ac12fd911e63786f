//! SVG source text -> [`Element`] tree, using the quick-xml event reader.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use super::tree::{Element, Node};

/// Parse failure with the byte offset where the reader stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub position: u64,
    pub message: String,
}

impl ParseFailure {
    fn new(position: u64, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Parse XML text and return its root element.
///
/// The XML declaration, doctype, processing instructions and anything outside
/// the root element are dropped.
pub fn parse_root(content: &str) -> Result<Element, ParseFailure> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    // Open elements, innermost last.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| ParseFailure::new(reader.error_position() as u64, e.to_string()))?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&root, &stack, position)?;
                stack.push(element_from_start(&start, position)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root, &stack, position)?;
                let elem = element_from_start(&start, position)?;
                close_element(elem, &mut stack, &mut root);
            }
            Event::End(_) => {
                // quick-xml verifies that end names match.
                let elem = stack
                    .pop()
                    .ok_or_else(|| ParseFailure::new(position, "unexpected closing tag"))?;
                close_element(elem, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let raw = utf8(text.as_ref(), position)?;
                push_child(&mut stack, Node::Text(raw.into_owned()), position)?;
            }
            Event::GeneralRef(reference) => {
                let name = utf8(reference.as_ref(), position)?;
                push_child(&mut stack, Node::Text(format!("&{name};")), position)?;
            }
            Event::CData(data) => {
                let raw = utf8(data.as_ref(), position)?;
                push_child(&mut stack, Node::CData(raw.into_owned()), position)?;
            }
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = utf8(comment.as_ref(), position)?;
                    parent.children.push(Node::Comment(raw.into_owned()));
                }
            }
            Event::Eof => break,
            // Decl, PI, DocType
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseFailure::new(
            reader.buffer_position() as u64,
            format!("unclosed element <{}>", open.name),
        ));
    }

    root.ok_or_else(|| ParseFailure::new(0, "document has no root element"))
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> Result<Element, ParseFailure> {
    let name = utf8(start.name().as_ref(), position)?.into_owned();
    let mut elem = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseFailure::new(position, e.to_string()))?;
        let key = utf8(attr.key.as_ref(), position)?.into_owned();
        let raw = utf8(&attr.value, position)?;
        let value = unescape(&raw).map_err(|e| ParseFailure::new(position, e.to_string()))?;
        elem.set_attr(key, value.into_owned());
    }

    Ok(elem)
}

fn ensure_single_root(
    root: &Option<Element>,
    stack: &[Element],
    position: u64,
) -> Result<(), ParseFailure> {
    if root.is_some() && stack.is_empty() {
        return Err(ParseFailure::new(position, "multiple root elements"));
    }
    Ok(())
}

fn close_element(elem: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(elem)),
        None => *root = Some(elem),
    }
}

fn push_child(stack: &mut [Element], node: Node, position: u64) -> Result<(), ParseFailure> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => match &node {
            // Whitespace around the root element.
            Node::Text(text) if text.trim().is_empty() => Ok(()),
            _ => Err(ParseFailure::new(
                position,
                "character data outside root element",
            )),
        },
    }
}

fn utf8(bytes: &[u8], position: u64) -> Result<Cow<'_, str>, ParseFailure> {
    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(|e| ParseFailure::new(position, e.to_string()))
}
