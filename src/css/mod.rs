//! Minimal, lossless stylesheet model.
//!
//! This is the host side of the rewriter: just enough structure to find
//! declaration blocks and their declarations, and to write the stylesheet back
//! byte for byte where nothing changed.
//!
//! ```text
//! Stylesheet
//! ├── Raw          whitespace, comments, `@import ...;`
//! ├── Declaration  prop: value [!important];
//! └── Rule         prelude { nested nodes }
//! ```

pub mod value;

use std::fmt::{self, Write};
use std::sync::LazyLock;

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};
use regex::Regex;

pub use value::{UrlNode, ValueNode, ValueTree};

static IMPORTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!\s*important$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssNode {
    Raw(String),
    Rule(Rule),
    Declaration(Declaration),
}

/// A qualified rule or block at-rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Everything before `{`, e.g. `\n.icon:hover ` or `@media print `.
    pub prelude: String,
    pub nodes: Vec<CssNode>,
    close: String,
}

/// `prop: value`, with the surrounding source text kept for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub prop: String,
    /// Value without surrounding whitespace and without `!important`.
    pub value: String,
    pub important: bool,
    before: String,
    after: String,
    terminated: bool,
}

impl Declaration {
    /// Build a declaration outside any stylesheet, printed as `prop: value;`.
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        let prop = prop.into();
        Self {
            before: format!("{prop}: "),
            prop,
            value: value.into(),
            important: false,
            after: String::new(),
            terminated: true,
        }
    }

    fn write_css<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str(&self.before)?;
        out.write_str(&self.value)?;
        out.write_str(&self.after)?;
        if self.terminated {
            out.write_char(';')?;
        }
        Ok(())
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_css(f)
    }
}

impl CssNode {
    pub fn as_declaration(&self) -> Option<&Declaration> {
        match self {
            Self::Declaration(decl) => Some(decl),
            _ => None,
        }
    }

    fn write_css<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Self::Raw(text) => out.write_str(text),
            Self::Declaration(decl) => decl.write_css(out),
            Self::Rule(rule) => {
                out.write_str(&rule.prelude)?;
                out.write_char('{')?;
                for node in &rule.nodes {
                    node.write_css(out)?;
                }
                out.write_str(&rule.close)
            }
        }
    }
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub nodes: Vec<CssNode>,
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        Self {
            nodes: parse_items(&mut parser, css),
        }
    }

    /// Call `f` with every node list that can hold declarations: the
    /// stylesheet root first, then each rule body depth-first.
    pub fn for_each_block_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut [CssNode]),
    {
        visit_blocks(&mut self.nodes, &mut f);
    }

    /// All declarations, in source order.
    pub fn declarations(&self) -> Vec<&Declaration> {
        let mut out = Vec::new();
        collect_declarations(&self.nodes, &mut out);
        out
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            node.write_css(f)?;
        }
        Ok(())
    }
}

fn visit_blocks<F: FnMut(&mut [CssNode])>(nodes: &mut [CssNode], f: &mut F) {
    f(nodes);
    for node in nodes.iter_mut() {
        if let CssNode::Rule(rule) = node {
            visit_blocks(&mut rule.nodes, f);
        }
    }
}

fn collect_declarations<'a>(nodes: &'a [CssNode], out: &mut Vec<&'a Declaration>) {
    for node in nodes {
        match node {
            CssNode::Declaration(decl) => out.push(decl),
            CssNode::Rule(rule) => collect_declarations(&rule.nodes, out),
            CssNode::Raw(_) => {}
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// How one item of a block ended.
enum ItemEnd {
    /// `;` consumed, value ends before it.
    Semicolon(SourcePosition),
    /// End of input or of the enclosing block.
    Exhausted,
    /// A `{}` block was consumed and pushed as a rule.
    Rule,
}

fn parse_items<'i>(input: &mut Parser<'i, '_>, source: &'i str) -> Vec<CssNode> {
    let mut nodes = Vec::new();

    loop {
        let item_start = input.position();
        let mut significant = 0usize;
        // Name of the leading identifier, if the item starts with one.
        let mut ident: Option<String> = None;
        // Position right after `prop:` when the item looks like a declaration.
        let mut colon_end: Option<SourcePosition> = None;

        let end = loop {
            let before = input.position();
            let token = match input.next_including_whitespace_and_comments() {
                Ok(token) => token.clone(),
                Err(_) => break ItemEnd::Exhausted,
            };

            match token {
                Token::WhiteSpace(_) | Token::Comment(_) => {}
                Token::Semicolon => break ItemEnd::Semicolon(before),
                Token::CurlyBracketBlock => {
                    let prelude = slice(source, item_start, before).to_string();
                    let (inner_end, children) = input
                        .parse_nested_block(|p| {
                            let children = parse_items(p, source);
                            Ok::<_, ParseError<'i, ()>>((p.position(), children))
                        })
                        .unwrap_or_else(|_| (input.position(), Vec::new()));
                    let close = slice(source, inner_end, input.position()).to_string();
                    nodes.push(CssNode::Rule(Rule {
                        prelude,
                        nodes: children,
                        close,
                    }));
                    break ItemEnd::Rule;
                }
                Token::Colon if significant == 1 && ident.is_some() && colon_end.is_none() => {
                    colon_end = Some(input.position());
                    significant += 1;
                }
                other => {
                    if significant == 0
                        && let Token::Ident(name) = &other
                    {
                        ident = Some(name.to_string());
                    }
                    significant += 1;
                }
            }
        };

        let value_end = match end {
            ItemEnd::Rule => continue,
            ItemEnd::Semicolon(before) => before,
            ItemEnd::Exhausted => input.position(),
        };
        let terminated = matches!(end, ItemEnd::Semicolon(_));

        match (colon_end, ident) {
            (Some(colon_end), Some(prop)) => nodes.push(CssNode::Declaration(declaration(
                prop,
                slice(source, item_start, colon_end),
                slice(source, colon_end, value_end),
                terminated,
            ))),
            _ => {
                let text = slice(source, item_start, input.position());
                if !text.is_empty() {
                    nodes.push(CssNode::Raw(text.to_string()));
                }
            }
        }

        if !terminated {
            break;
        }
    }

    nodes
}

/// Split `  fill :` + ` red !important ` into the declaration parts.
///
/// `head` may start with comments; they stay in the printed text but never in
/// `prop`.
fn declaration(prop: String, head: &str, raw_value: &str, terminated: bool) -> Declaration {
    let lead = raw_value.len() - raw_value.trim_start().len();
    let body = raw_value.trim();
    let (value, important) = match IMPORTANT.find(body) {
        Some(m) => (body[..m.start()].trim_end(), true),
        None => (body, false),
    };

    Declaration {
        prop,
        value: value.to_string(),
        important,
        before: format!("{head}{}", &raw_value[..lead]),
        after: raw_value[lead + value.len()..].to_string(),
        terminated,
    }
}

fn slice(source: &str, start: SourcePosition, end: SourcePosition) -> &str {
    source
        .get(start.byte_index()..end.byte_index())
        .unwrap_or_default()
}
