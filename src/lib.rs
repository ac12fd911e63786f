//! Inline SVG fragment references of CSS stylesheets as data URIs.
//!
//! `url(icons.svg#check)` in a declaration value is replaced by a
//! `data:image/svg+xml` URI holding the `check` element of `icons.svg`,
//! promoted to a standalone `<svg>` and carrying the `color`, `fill`,
//! `height`, `stroke`, `stroke-width` and `width` declarations found next to
//! it.
//!
//! ```ignore
//! use svg_fragments::{config::Options, process};
//!
//! let out = process(".a { background: url(icons.svg#check); fill: red }", &Options::default(), None);
//! for warning in &out.warnings {
//!     eprintln!("{warning}");
//! }
//! ```
//!
//! # Modules
//!
//! | Module       | Purpose                                             |
//! |--------------|-----------------------------------------------------|
//! | [`svg`]      | XML tree, parser, serializer, lookup by id          |
//! | [`fragment`] | Promotion of an element to a root `<svg>`, overlay  |
//! | [`uri`]      | UTF-8 and base64 `data:` URI encoding               |
//! | [`css`]      | Lossless stylesheet and value trees                 |
//! | [`rewrite`]  | Declaration rewriter and per-pass document cache    |

pub mod config;
pub mod css;
pub mod error;
pub mod fragment;
pub mod logger;
pub mod rewrite;
pub mod svg;
pub mod uri;
pub mod utils;

pub use config::Options;
pub use error::{LoadError, Warning};
pub use rewrite::{Processed, RewritePass, process};
