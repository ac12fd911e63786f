//! Rewriter options, read from `svg-fragments.toml`.
//!
//! ```toml
//! # data URI flavour: true for percent-encoded UTF-8, false for base64
//! utf8 = true
//! ```
//!
//! The historical `encoding = "base64" | "utf8"` key is still accepted and
//! mapped onto `utf8`.

mod error;

pub use error::ConfigError;

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::log;
use crate::uri::Encoding;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "svg-fragments.toml";

/// Options of a rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Emit percent-encoded UTF-8 data URIs instead of base64.
    pub utf8: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { utf8: true }
    }
}

/// Historical spelling of the `utf8` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyEncoding {
    Base64,
    Utf8,
}

/// On-disk shape, before the legacy key is folded in.
#[derive(Debug, Default, Deserialize)]
struct RawOptions {
    utf8: Option<bool>,
    encoding: Option<LegacyEncoding>,
}

impl Options {
    pub const fn encoding(&self) -> Encoding {
        Encoding::from_utf8_flag(self.utf8)
    }

    /// Parse options from a TOML string, ignoring unknown keys.
    pub fn from_str(content: &str) -> Result<Self> {
        let raw: RawOptions = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(Self::resolve(raw)?)
    }

    /// Load options from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (options, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(options)
    }

    /// Load `path` when it exists, defaults otherwise.
    ///
    /// `required` turns a missing file into an error.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if path.is_file() {
            return Self::from_path(path);
        }
        if required {
            return Err(ConfigError::Io(
                path.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            )
            .into());
        }
        Ok(Self::default())
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let raw: RawOptions =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                ignored.push(path.to_string());
            })
            .map_err(ConfigError::from)?;
        Ok((Self::resolve(raw)?, ignored))
    }

    fn resolve(raw: RawOptions) -> Result<Self, ConfigError> {
        let Some(encoding) = raw.encoding else {
            return Ok(Self {
                utf8: raw.utf8.unwrap_or(true),
            });
        };

        log!("warning"; "`encoding` is deprecated, use `utf8 = true | false` instead");
        let from_encoding = encoding == LegacyEncoding::Utf8;
        match raw.utf8 {
            Some(utf8) if utf8 != from_encoding => Err(ConfigError::Validation(format!(
                "`utf8 = {utf8}` conflicts with `encoding = \"{}\"`",
                if from_encoding { "utf8" } else { "base64" }
            ))),
            _ => Ok(Self {
                utf8: from_encoding,
            }),
        }
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
fn test_parse_config(content: &str) -> Options {
    let (parsed, ignored) = Options::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
