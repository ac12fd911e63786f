//! Owned, mutable SVG element tree.
//!
//! Text, CDATA and comments are kept in their raw (escaped) source form so an
//! untouched subtree serializes back to what was parsed. Attribute values are
//! stored unescaped and escaped again on output.

use std::fmt::{self, Write};

use quick_xml::escape::escape;

/// Ordered attribute list.
///
/// Setting an existing name keeps its position, a new name is appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (key, value) in iter {
            attrs.set(key, value);
        }
        attrs
    }
}

/// Child node of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Escaped character data, entity references included verbatim.
    Text(String),
    /// Content between `<![CDATA[` and `]]>`.
    CData(String),
    /// Content between `<!--` and `-->`.
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(elem) => Some(elem),
            _ => None,
        }
    }
}

/// An XML element: qualified tag name, attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id")
    }

    #[inline]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.set(name, value);
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    /// Child elements in document order (text and comments skipped).
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Follow a path of element-child indices down from `self`.
    pub fn descend(&self, path: &[usize]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |elem, &index| elem.elements().nth(index))
    }

    /// Serialize this element and its subtree as XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        // Writing into a String cannot fail.
        let _ = self.write_xml(&mut out);
        out
    }

    pub fn write_xml<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_char('<')?;
        out.write_str(&self.name)?;
        for (key, value) in self.attrs.iter() {
            write!(out, " {key}=\"{}\"", escape(value))?;
        }

        if self.children.is_empty() {
            return out.write_str("/>");
        }

        out.write_char('>')?;
        for child in &self.children {
            match child {
                Node::Element(elem) => elem.write_xml(out)?,
                Node::Text(text) => out.write_str(text)?,
                Node::CData(data) => write!(out, "<![CDATA[{data}]]>")?,
                Node::Comment(comment) => write!(out, "<!--{comment}-->")?,
            }
        }
        write!(out, "</{}>", self.name)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_xml(f)
    }
}
