//! Error taxonomy for fragment resolution.
//!
//! Nothing in here aborts a rewrite pass. Load failures are turned into
//! [`Warning`]s at the point of use and the offending `url()` is left
//! untouched. A missing fragment id is not an error at all. Encoding writes
//! into a `String` and cannot fail.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

// ============================================================================
// LoadError
// ============================================================================

/// Failure to obtain a parsed SVG document for a referenced file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("SVG file not found: `{}`", .0.display())]
    NotFound(PathBuf),

    #[error("IO error when reading `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed SVG `{}` at position {position}: {message}", .path.display())]
    XmlParse {
        path: PathBuf,
        position: u64,
        message: String,
    },
}

impl LoadError {
    /// Classify an IO error raised while reading `path`.
    pub fn from_io(path: PathBuf, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Read { path, source: err }
        }
    }

    /// Path of the file that failed to load.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound(path) | Self::Read { path, .. } | Self::XmlParse { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// Warning
// ============================================================================

/// Non-fatal diagnostic attached to the `url()` node that caused it.
///
/// The error is shared through the per-pass cache, so every declaration
/// referencing the same broken file reports the same underlying error.
#[derive(Debug, Clone)]
pub struct Warning {
    /// Source text of the `url()` node, e.g. `url(icons.svg#check)`.
    pub node: String,
    /// Property of the declaration holding the node.
    pub declaration: String,
    pub error: Arc<LoadError>,
}

impl Warning {
    pub fn new(
        node: impl Into<String>,
        declaration: impl Into<String>,
        error: Arc<LoadError>,
    ) -> Self {
        Self {
            node: node.into(),
            declaration: declaration.into(),
            error,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.declaration, self.error, self.node)
    }
}
