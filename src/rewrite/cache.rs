//! Per-pass document cache.
//!
//! Keyed by resolved path. Each entry is a single-assignment cell, so
//! concurrent requests for one path share a single read and parse. The cache
//! lives inside one [`RewritePass`](super::RewritePass) and is dropped with it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::debug;
use crate::error::LoadError;
use crate::svg::SvgDocument;

pub type LoadResult = Result<Arc<SvgDocument>, Arc<LoadError>>;

type Slot = Arc<OnceLock<LoadResult>>;

#[derive(Debug, Default)]
pub struct DocumentCache {
    slots: Mutex<FxHashMap<PathBuf, Slot>>,
    reads: AtomicUsize,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed document for `path`, loading it on first request.
    ///
    /// Failures are cached too: a broken file is read once per pass.
    pub fn get(&self, path: &Path) -> LoadResult {
        let slot = self.slot(path);
        slot.get_or_init(|| {
            self.reads.fetch_add(1, Ordering::Relaxed);
            load(path)
        })
        .clone()
    }

    /// Load every path in parallel. Already loaded paths are skipped.
    pub fn prefetch(&self, paths: &[PathBuf]) {
        paths.par_iter().for_each(|path| {
            let _ = self.get(path);
        });
    }

    /// Number of distinct paths requested so far.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Number of files actually read from disk, failures included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    // The map lock is only held to fetch the slot, never while loading.
    fn slot(&self, path: &Path) -> Slot {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(path) {
            return Arc::clone(slot);
        }
        let slot = Slot::default();
        slots.insert(path.to_path_buf(), Arc::clone(&slot));
        slot
    }
}

fn load(path: &Path) -> LoadResult {
    debug!("svg"; "loading {}", path.display());
    SvgDocument::open(path).map(Arc::new).map_err(Arc::new)
}
