//! `data:image/svg+xml` URI encoding.
//!
//! Two encodings, selected by [`Encoding`]:
//!
//! - **UTF-8**: canonicalized and percent-encoded, meant to be emitted inside
//!   a single-quoted `url('...')`
//! - **Base64**: raw serialized bytes, safe as a bare `url(...)` token
//!
//! The UTF-8 steps are order sensitive. Ampersands are pre-encoded before the
//! generic pass, and parentheses are re-encoded after the readable escapes are
//! decoded again.

use std::borrow::Cow;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

use crate::fragment::MaterializedFragment;

pub const UTF8_PREFIX: &str = "data:image/svg+xml;charset=utf-8,";
pub const BASE64_PREFIX: &str = "data:image/svg+xml;base64,";

/// Bytes left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escapes that are legal unencoded inside a data URI, with their readable form.
const COMPACT_ESCAPES: [(&str, &str); 5] = [
    ("%20", " "),
    ("%22", "'"),
    ("%2F", "/"),
    ("%3A", ":"),
    ("%3D", "="),
];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\n\r\s\t]+").unwrap());
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Data URI flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Base64,
}

impl Encoding {
    pub const fn from_utf8_flag(utf8: bool) -> Self {
        if utf8 { Self::Utf8 } else { Self::Base64 }
    }

    /// UTF-8 URIs contain spaces and must be emitted as a quoted string.
    pub const fn needs_quotes(self) -> bool {
        matches!(self, Self::Utf8)
    }
}

/// Serialize `fragment` and encode it as a data URI.
pub fn encode(fragment: &MaterializedFragment, encoding: Encoding) -> String {
    encode_xml(&fragment.to_xml(), encoding)
}

pub fn encode_xml(xml: &str, encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => format!("{UTF8_PREFIX}{}", encode_utf8_body(xml)),
        Encoding::Base64 => format!("{BASE64_PREFIX}{}", STANDARD.encode(xml.as_bytes())),
    }
}

/// Canonicalize and percent-encode XML for a `charset=utf-8` data URI.
pub fn encode_utf8_body(xml: &str) -> String {
    let collapsed = WHITESPACE.replace_all(xml, " ");
    let stripped = COMMENT.replace_all(&collapsed, "");
    let ampersands = stripped.replace('&', "%26");

    let mut body = utf8_percent_encode(&ampersands, URI_COMPONENT).to_string();
    for (escape, readable) in COMPACT_ESCAPES {
        body = body.replace(escape, readable);
    }

    body.replace('\'', "\\'")
        .replace('(', "%28")
        .replace(')', "%29")
}

/// Reverse [`encode_utf8_body`] as far as it is reversible.
///
/// Whitespace collapsing and comment removal are lossy; double quotes come
/// back as single quotes and ampersands as `%26`.
pub fn decode_utf8_body(body: &str) -> String {
    let unescaped = body.replace("\\'", "'");
    let decoded = percent_decode_str(&unescaped)
        .decode_utf8()
        .map(Cow::into_owned);
    decoded.unwrap_or(unescaped)
}

/// Decode the payload of a URI produced by [`encode_xml`].
///
/// Returns `None` for anything that is not an SVG data URI.
pub fn decode(uri: &str) -> Option<String> {
    if let Some(body) = uri.strip_prefix(UTF8_PREFIX) {
        return Some(decode_utf8_body(body));
    }
    let payload = uri.strip_prefix(BASE64_PREFIX)?;
    let bytes = STANDARD.decode(payload).ok()?;
    String::from_utf8(bytes).ok()
}
