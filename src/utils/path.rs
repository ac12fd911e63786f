//! Path utilities.
//!
//! Pure functions apart from [`normalize_path`], which consults the file
//! system and the current directory.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Directory that relative references in `source` resolve against.
///
/// The parent directory of the source file, or the current directory when the
/// source is unknown.
pub fn base_dir(source: Option<&Path>) -> PathBuf {
    match source.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => normalize_path(parent),
        _ => normalize_path(Path::new(".")),
    }
}

/// Remove `.` and `..` components without touching the file system.
///
/// `..` at the root is dropped, so the result never climbs above it.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve the file part of a reference against `base`.
///
/// Leading slashes are joined like any other relative part, so a reference
/// can never point outside of `base` through an absolute path.
pub fn resolve_reference(base: &Path, file: &str) -> PathBuf {
    normalize_lexical(&base.join(file.trim_start_matches('/')))
}

/// Split a URL into path and fragment parts.
///
/// The fragment is empty when there is no `#`, and also for a trailing `#`.
///
/// ```
/// use svg_fragments::utils::path::split_path_fragment;
/// assert_eq!(split_path_fragment("icons.svg#check"), ("icons.svg", "check"));
/// assert_eq!(split_path_fragment("icons.svg"), ("icons.svg", ""));
/// ```
#[inline]
pub fn split_path_fragment(url: &str) -> (&str, &str) {
    url.split_once('#').unwrap_or((url, ""))
}
