//! `file.svg#id` references found in `url()` arguments.

use std::path::{Path, PathBuf};

use crate::utils::path::{resolve_reference, split_path_fragment};

/// Marker every rewritable url argument contains.
pub const SVG_FRAGMENT_MARKER: &str = ".svg#";

/// A resolved reference to an SVG file and an optional fragment id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentReference {
    pub file: PathBuf,
    /// Empty for the whole document.
    pub id: String,
}

impl FragmentReference {
    /// Parse a url argument, resolving its file part against `base`.
    ///
    /// Returns `None` unless the argument contains `.svg#`.
    pub fn parse(argument: &str, base: &Path) -> Option<Self> {
        if !argument.contains(SVG_FRAGMENT_MARKER) {
            return None;
        }
        let (file, id) = split_path_fragment(argument);
        Some(Self {
            file: resolve_reference(base, file),
            id: id.to_string(),
        })
    }

    pub fn is_whole_document(&self) -> bool {
        self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let base = Path::new("/site/css");
        let reference = FragmentReference::parse("../img/icons.svg#check", base).unwrap();
        assert_eq!(reference.file, PathBuf::from("/site/img/icons.svg"));
        assert_eq!(reference.id, "check");
        assert!(!reference.is_whole_document());
    }

    #[test]
    fn test_whole_document() {
        let reference = FragmentReference::parse("icons.svg#", Path::new("/css")).unwrap();
        assert!(reference.is_whole_document());
        assert_eq!(reference.file, PathBuf::from("/css/icons.svg"));
    }

    #[test]
    fn test_non_matching() {
        let base = Path::new("/css");
        assert!(FragmentReference::parse("icons.svg", base).is_none());
        assert!(FragmentReference::parse("image.png#x", base).is_none());
        assert!(FragmentReference::parse("#local", base).is_none());
    }

    #[test]
    fn test_id_keeps_later_hashes() {
        let reference = FragmentReference::parse("a.svg#b#c", Path::new("/")).unwrap();
        assert_eq!(reference.id, "b#c");
    }
}
