//! SVG document model.
//!
//! # Modules
//!
//! - [`tree`]: owned element tree and XML serialization
//! - [`parse`]: quick-xml reader -> tree
//! - [`locate`]: depth-first lookup by `id`
//!
//! An [`SvgDocument`] is immutable once parsed. The only interior state is the
//! id lookup memo, so one parsed document can be shared by every declaration
//! of a rewrite pass (and across rayon workers).

pub mod locate;
pub mod parse;
pub mod tree;

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub use locate::{find_by_id, find_path_by_id};
pub use tree::{Attributes, Element, Node};

use crate::error::LoadError;

/// A parsed SVG file.
#[derive(Debug)]
pub struct SvgDocument {
    path: PathBuf,
    root: Element,
    /// id -> element-child path from `root` (`None` when the id is absent).
    ids: Mutex<FxHashMap<String, Option<Vec<usize>>>>,
}

impl SvgDocument {
    /// Parse SVG source text. `path` is only used for error reporting.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, LoadError> {
        let path = path.into();
        match parse::parse_root(content) {
            Ok(root) => Ok(Self::from_root(path, root)),
            Err(failure) => Err(LoadError::XmlParse {
                path,
                position: failure.position,
                message: failure.message,
            }),
        }
    }

    /// Read and parse an SVG file.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let content =
            fs::read_to_string(path).map_err(|err| LoadError::from_io(path.to_path_buf(), err))?;
        Self::parse(path, &content)
    }

    pub fn from_root(path: impl Into<PathBuf>, root: Element) -> Self {
        Self {
            path: path.into(),
            root,
            ids: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// `viewBox` of the root element, inherited by fragments lacking their own.
    pub fn view_box(&self) -> Option<&str> {
        self.root.attr("viewBox").filter(|v| !v.is_empty())
    }

    /// Find an element by id, searching at most once per id.
    pub fn locate(&self, id: &str) -> Option<&Element> {
        let path = {
            let mut ids = self.ids.lock();
            ids.entry(id.to_string())
                .or_insert_with(|| find_path_by_id(&self.root, id))
                .clone()
        };
        path.and_then(|path| self.root.descend(&path))
    }

    /// Number of distinct ids looked up so far.
    pub fn lookups(&self) -> usize {
        self.ids.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICONS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16">
  <g id="check"><path d="M2 8l4 4 8-8"/></g>
</svg>"#;

    #[test]
    fn test_locate_memoizes_hits_and_misses() {
        let doc = SvgDocument::parse("icons.svg", ICONS).unwrap();
        assert_eq!(doc.locate("check").map(|e| e.name.as_str()), Some("g"));
        assert_eq!(doc.locate("check").map(|e| e.name.as_str()), Some("g"));
        assert!(doc.locate("missing").is_none());
        assert!(doc.locate("missing").is_none());
        assert_eq!(doc.lookups(), 2);
    }

    #[test]
    fn test_view_box() {
        let doc = SvgDocument::parse("icons.svg", ICONS).unwrap();
        assert_eq!(doc.view_box(), Some("0 0 16 16"));

        let doc = SvgDocument::parse("bare.svg", r#"<svg viewBox=""/>"#).unwrap();
        assert_eq!(doc.view_box(), None);
    }

    #[test]
    fn test_parse_error_carries_path() {
        let err = SvgDocument::parse("broken.svg", "<svg><g></svg>").unwrap_err();
        assert!(matches!(err, LoadError::XmlParse { .. }));
        assert_eq!(err.path(), &PathBuf::from("broken.svg"));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SvgDocument::open(&dir.path().join("nope.svg")).unwrap_err();
        assert!(err.is_not_found());
    }
}
