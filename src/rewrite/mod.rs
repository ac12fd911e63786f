//! Declaration rewriter.
//!
//! Replaces `url(file.svg#id)` references in declaration values with
//! self-contained `data:image/svg+xml` URIs.
//!
//! # Flow
//!
//! ```text
//! declaration value
//!     │  prefilter regex
//!     ▼
//! ValueTree::parse ── url nodes containing `.svg#`
//!     │
//!     ├─► FragmentReference (file resolved against the base directory)
//!     ├─► DocumentCache::get ── LoadError ──► Warning, node untouched
//!     ├─► materialize_from ──── id absent ──► node untouched
//!     ├─► Overlay::apply (whitelisted sibling declarations)
//!     └─► uri::encode ──► UrlNode::set_argument
//! ```
//!
//! One [`RewritePass`] covers one stylesheet. Parsed documents are shared by
//! every declaration of the pass; each declaration gets its own fragment
//! clone.

mod cache;
mod reference;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

pub use cache::{DocumentCache, LoadResult};
pub use reference::{FragmentReference, SVG_FRAGMENT_MARKER};

use crate::config::Options;
use crate::css::{CssNode, Declaration, Stylesheet, UrlNode, ValueTree};
use crate::debug;
use crate::error::Warning;
use crate::fragment::{Overlay, materialize_from};
use crate::uri::{self, Encoding};
use crate::utils::path::base_dir;

/// Values that may hold an SVG fragment url. Anything else is left alone
/// without parsing.
static CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)url\(.+\.svg#.+\)(\s|$)").unwrap());

/// Whether a declaration value is worth parsing.
#[inline]
pub fn is_candidate(value: &str) -> bool {
    CANDIDATE.is_match(value)
}

/// Result of rewriting a single value.
#[derive(Debug, Default)]
pub struct Rewritten {
    /// New value, `None` when nothing changed.
    pub value: Option<String>,
    pub warnings: Vec<Warning>,
}

/// Result of processing a whole stylesheet.
#[derive(Debug)]
pub struct Processed {
    pub css: String,
    pub warnings: Vec<Warning>,
}

/// One rewrite pass over one stylesheet.
#[derive(Debug)]
pub struct RewritePass {
    encoding: Encoding,
    base_dir: PathBuf,
    cache: DocumentCache,
}

impl RewritePass {
    /// `source` is the stylesheet's own path; references resolve against its
    /// directory, or against the current directory when it is unknown.
    pub fn new(options: &Options, source: Option<&Path>) -> Self {
        Self::with_base_dir(options.encoding(), base_dir(source))
    }

    pub fn with_base_dir(encoding: Encoding, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            encoding,
            base_dir: base_dir.into(),
            cache: DocumentCache::new(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Rewrite and re-serialize a stylesheet.
    pub fn process(&self, css: &str) -> Processed {
        let mut sheet = Stylesheet::parse(css);
        let warnings = self.rewrite_stylesheet(&mut sheet);
        Processed {
            css: sheet.to_string(),
            warnings,
        }
    }

    /// Rewrite every declaration block of `sheet` in place.
    pub fn rewrite_stylesheet(&self, sheet: &mut Stylesheet) -> Vec<Warning> {
        self.prefetch(sheet);

        let mut warnings = Vec::new();
        sheet.for_each_block_mut(|block| warnings.extend(self.rewrite_block(block)));

        if !warnings.is_empty() {
            debug!("rewrite"; "{} warning(s) in {}", warnings.len(), self.base_dir.display());
        }
        warnings
    }

    /// Load every distinct file referenced by `sheet` in parallel.
    pub fn prefetch(&self, sheet: &Stylesheet) {
        let mut seen = FxHashSet::default();
        let files: Vec<PathBuf> = sheet
            .declarations()
            .into_iter()
            .filter(|decl| is_candidate(&decl.value))
            .flat_map(|decl| self.references(&decl.value))
            .map(|reference| reference.file)
            .filter(|file| seen.insert(file.clone()))
            .collect();

        if files.len() > 1 {
            debug!("rewrite"; "prefetching {} svg files", files.len());
        }
        self.cache.prefetch(&files);
    }

    /// Fragment references in a declaration value, in source order.
    pub fn references(&self, value: &str) -> Vec<FragmentReference> {
        let mut tree = ValueTree::parse(value);
        tree.urls_mut()
            .into_iter()
            .filter_map(|url| FragmentReference::parse(url.argument(), &self.base_dir))
            .collect()
    }

    /// Rewrite the declarations of one block, reading the overlay from the
    /// declarations of that same block.
    pub fn rewrite_block(&self, block: &mut [CssNode]) -> Vec<Warning> {
        let overlay = Overlay::collect(
            block
                .iter()
                .filter_map(CssNode::as_declaration)
                .map(|decl| (decl.prop.as_str(), decl.value.as_str())),
        );

        let mut warnings = Vec::new();
        for node in block.iter_mut() {
            if let CssNode::Declaration(decl) = node {
                warnings.extend(self.rewrite_declaration(decl, &overlay));
            }
        }
        warnings
    }

    /// Rewrite one declaration in place. The value is only replaced when it
    /// actually changed.
    pub fn rewrite_declaration(&self, decl: &mut Declaration, overlay: &Overlay) -> Vec<Warning> {
        let Rewritten { value, warnings } = self.rewrite_value(&decl.prop, &decl.value, overlay);
        if let Some(value) = value {
            decl.value = value;
        }
        warnings
    }

    /// Rewrite the fragment urls of a declaration value.
    pub fn rewrite_value(&self, prop: &str, value: &str, overlay: &Overlay) -> Rewritten {
        if !is_candidate(value) {
            return Rewritten::default();
        }

        let mut tree = ValueTree::parse(value);
        let mut warnings = Vec::new();
        for url in tree.urls_mut() {
            if let Err(warning) = self.rewrite_url(url, prop, overlay) {
                warnings.push(warning);
            }
        }

        let value = tree.is_modified().then(|| tree.to_string());
        Rewritten { value, warnings }
    }

    fn rewrite_url(&self, url: &mut UrlNode, prop: &str, overlay: &Overlay) -> Result<(), Warning> {
        let Some(reference) = FragmentReference::parse(url.argument(), &self.base_dir) else {
            return Ok(());
        };

        let doc = self
            .cache
            .get(&reference.file)
            .map_err(|err| Warning::new(url.raw(), prop, err))?;

        let Some(mut fragment) = materialize_from(&doc, &reference.id) else {
            debug!("rewrite"; "no element `#{}` in {}", reference.id, reference.file.display());
            return Ok(());
        };
        overlay.apply(&mut fragment);

        if reference.is_whole_document() {
            debug!("rewrite"; "inlining whole document {}", reference.file.display());
        }
        let data = uri::encode(&fragment, self.encoding);
        let quote = match self.encoding {
            Encoding::Utf8 => Some('\''),
            Encoding::Base64 => url.quote(),
        };
        url.set_argument(data, quote);
        Ok(())
    }
}

/// Rewrite a whole stylesheet in one pass.
///
/// `source` is the path the stylesheet was read from, if any.
pub fn process(css: &str, options: &Options, source: Option<&Path>) -> Processed {
    let pass = RewritePass::new(options, source);
    let processed = pass.process(css);
    let cache = pass.cache();
    debug!("rewrite"; "{} svg file(s) referenced, {} read", cache.len(), cache.reads());
    processed
}
