//! Declaration value syntax tree.
//!
//! Built on the `cssparser` tokenizer. Every node keeps the source text it was
//! parsed from, so stringifying an untouched tree gives back the exact input.
//! Only `url()` nodes are editable.

use std::fmt::{self, Write};

use cssparser::{ParseError, Parser, ParserInput, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// Anything that is not a function or a url, verbatim.
    Raw(String),
    Function(FunctionNode),
    Url(UrlNode),
}

/// A function call or a bracketed block with its parsed contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    /// Opening text, e.g. `image-set(` or `(`.
    pub open: String,
    pub nodes: Vec<ValueNode>,
    /// Closing bracket, empty when the input ended inside the block.
    pub close: String,
}

/// A `url(...)` token, bare or with a quoted string argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlNode {
    raw: String,
    argument: String,
    quote: Option<char>,
    modified: bool,
}

impl UrlNode {
    fn new(raw: &str, argument: &str, quote: Option<char>) -> Self {
        Self {
            raw: raw.to_string(),
            argument: argument.to_string(),
            quote,
            modified: false,
        }
    }

    /// The (unescaped) url argument.
    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    /// Source text of the node as it was parsed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replace the argument. The caller is responsible for escaping `argument`
    /// for the given quote style.
    pub fn set_argument(&mut self, argument: impl Into<String>, quote: Option<char>) {
        self.argument = argument.into();
        self.quote = quote;
        self.modified = true;
    }

    fn write_css<W: Write>(&self, out: &mut W) -> fmt::Result {
        if !self.modified {
            return out.write_str(&self.raw);
        }
        match self.quote {
            Some(q) => write!(out, "url({q}{}{q})", self.argument),
            None => write!(out, "url({})", self.argument),
        }
    }
}

impl fmt::Display for UrlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_css(f)
    }
}

/// Parsed declaration value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueTree {
    pub nodes: Vec<ValueNode>,
}

impl ValueTree {
    pub fn parse(value: &str) -> Self {
        let mut input = ParserInput::new(value);
        let mut parser = Parser::new(&mut input);
        Self {
            nodes: parse_nodes(&mut parser),
        }
    }

    /// All url nodes, depth-first in source order.
    pub fn urls_mut(&mut self) -> Vec<&mut UrlNode> {
        let mut urls = Vec::new();
        collect_urls(&mut self.nodes, &mut urls);
        urls
    }

    pub fn is_modified(&self) -> bool {
        self.nodes.iter().any(ValueNode::is_modified)
    }
}

impl ValueNode {
    fn is_modified(&self) -> bool {
        match self {
            Self::Raw(_) => false,
            Self::Url(url) => url.modified,
            Self::Function(func) => func.nodes.iter().any(Self::is_modified),
        }
    }

    fn write_css<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Self::Raw(text) => out.write_str(text),
            Self::Url(url) => url.write_css(out),
            Self::Function(func) => {
                out.write_str(&func.open)?;
                for node in &func.nodes {
                    node.write_css(out)?;
                }
                out.write_str(&func.close)
            }
        }
    }
}

impl fmt::Display for ValueTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            node.write_css(f)?;
        }
        Ok(())
    }
}

fn collect_urls<'a>(nodes: &'a mut [ValueNode], out: &mut Vec<&'a mut UrlNode>) {
    for node in nodes {
        match node {
            ValueNode::Url(url) => out.push(url),
            ValueNode::Function(func) => collect_urls(&mut func.nodes, out),
            ValueNode::Raw(_) => {}
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_nodes<'i>(input: &mut Parser<'i, '_>) -> Vec<ValueNode> {
    let mut nodes = Vec::new();

    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::UnquotedUrl(argument) => {
                let raw = input.slice_from(start);
                if raw.starts_with("url(") {
                    nodes.push(ValueNode::Url(UrlNode::new(raw, &argument, None)));
                } else {
                    push_raw(&mut nodes, raw);
                }
            }
            Token::Function(name) if &*name == "url" => {
                let argument = input
                    .parse_nested_block(|p| Ok::<_, ParseError<'i, ()>>(parse_quoted_argument(p)))
                    .unwrap_or_default();
                let raw = input.slice_from(start);

                match argument {
                    Some((argument, quote)) => {
                        nodes.push(ValueNode::Url(UrlNode::new(raw, &argument, Some(quote))));
                    }
                    None => push_raw(&mut nodes, raw),
                }
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let open = input.slice_from(start).to_string();
                let (inner_len, children) = input
                    .parse_nested_block(|p| {
                        let inner_start = p.position();
                        let children = parse_nodes(p);
                        Ok::<_, ParseError<'i, ()>>((p.slice_from(inner_start).len(), children))
                    })
                    .unwrap_or_default();
                let raw = input.slice_from(start);
                let close = raw.get(open.len() + inner_len..).unwrap_or_default();

                nodes.push(ValueNode::Function(FunctionNode {
                    open,
                    nodes: children,
                    close: close.to_string(),
                }));
            }
            _ => push_raw(&mut nodes, input.slice_from(start)),
        }
    }

    nodes
}

/// Argument of `url("...")`: exactly one quoted string, whitespace allowed.
fn parse_quoted_argument<'i>(input: &mut Parser<'i, '_>) -> Option<(String, char)> {
    let mut found = None;

    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => {}
            Token::QuotedString(value) if found.is_none() => {
                let quote = input.slice_from(start).chars().next().unwrap_or('"');
                found = Some((value.to_string(), quote));
            }
            _ => return None,
        }
    }

    found
}

/// Append raw text, merging with a preceding raw node.
fn push_raw(nodes: &mut Vec<ValueNode>, text: &str) {
    if let Some(ValueNode::Raw(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(ValueNode::Raw(text.to_string()));
    }
}
