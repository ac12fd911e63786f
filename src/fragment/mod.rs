//! Fragment materialization.
//!
//! Turns a located element (or a whole document) into an independent root
//! `<svg>` that can be overlaid with CSS attributes and encoded on its own.
//!
//! ```text
//! SvgDocument (cached, shared)
//!         │  locate(id)
//!         ▼
//!    ┌─────────────┐
//!    │ materialize │ ──► deep clone, renamed to <svg>, id removed,
//!    └──────┬──────┘     viewBox inherited, xmlns fixed
//!           ▼
//!    ┌─────────────┐
//!    │   overlay   │ ──► fill / stroke / width ... from sibling declarations
//!    └──────┬──────┘
//!           ▼
//!      uri::encode
//! ```

pub mod overlay;

use std::ops::{Deref, DerefMut};

pub use overlay::Overlay;

use crate::svg::{Element, SvgDocument};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// A standalone `<svg>` cloned out of a cached document.
///
/// Owns its whole subtree, so mutating it never reaches the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedFragment(Element);

impl MaterializedFragment {
    pub fn to_xml(&self) -> String {
        self.0.to_xml()
    }
}

impl Deref for MaterializedFragment {
    type Target = Element;

    fn deref(&self) -> &Element {
        &self.0
    }
}

impl DerefMut for MaterializedFragment {
    fn deref_mut(&mut self) -> &mut Element {
        &mut self.0
    }
}

/// Clone `source` and promote it to a root `<svg>`.
///
/// - tag renamed to `svg`
/// - `id` removed
/// - `viewBox` kept, or taken from `view_box_fallback` when absent or empty
/// - `xmlns` set to the SVG namespace
pub fn materialize(source: &Element, view_box_fallback: Option<&str>) -> MaterializedFragment {
    let mut elem = source.clone();

    elem.name = "svg".into();
    elem.remove_attr("id");

    let has_view_box = elem.attr("viewBox").is_some_and(|v| !v.is_empty());
    if !has_view_box && let Some(fallback) = view_box_fallback.filter(|v| !v.is_empty()) {
        elem.set_attr("viewBox", fallback);
    }

    elem.set_attr("xmlns", SVG_NAMESPACE);

    MaterializedFragment(elem)
}

/// Materialize the element with `id` from `doc`, or the whole document when
/// `id` is empty.
///
/// Returns `None` when the id does not exist. Prefixed namespace declarations
/// of the document root (`xmlns:xlink`, ...) are carried over so the fragment
/// stays well-formed on its own.
pub fn materialize_from(doc: &SvgDocument, id: &str) -> Option<MaterializedFragment> {
    let source = if id.is_empty() {
        doc.root()
    } else {
        doc.locate(id)?
    };

    let mut fragment = materialize(source, doc.view_box());
    for (key, value) in doc.root().attrs.iter() {
        if key.starts_with("xmlns:") && !fragment.attrs.contains(key) {
            fragment.set_attr(key, value);
        }
    }

    Some(fragment)
}
