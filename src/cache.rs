//! Memoization of the load → resolve → normalize pipeline.
//!
//! Recomputing is always safe (the pipeline is pure), so the cache is only
//! an optimization for callers that re-run queries against the same upload.
//! Entries are keyed by a SHA-256 hash of the input bytes and dropped only
//! by an explicit [`TableCache::clear`]; the cache is passed in by the
//! caller, never held in global state.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::{
    loader,
    normalize::{self, NormalizedTable},
    resolve::{self, ResolveMode},
};

type Fingerprint = [u8; 32];

#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<Fingerprint, NormalizedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
        Sha256::digest(bytes).into()
    }

    /// Returns the normalized table for `bytes`, running the full pipeline
    /// only on the first sight of this content.
    pub fn normalized(
        &mut self,
        bytes: &[u8],
        delimiter: Option<u8>,
        mode: ResolveMode,
    ) -> Result<&NormalizedTable> {
        let key = Self::fingerprint(bytes);
        if !self.entries.contains_key(&key) {
            let raw = loader::load_bytes(bytes, delimiter).context("Loading table")?;
            let mapping = resolve::resolve(&raw.headers, mode).context("Resolving column roles")?;
            let normalized = normalize::normalize(raw, mapping).context("Normalizing table")?;
            self.entries.insert(key, normalized);
        }
        Ok(&self.entries[&key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The user-triggered "clear and reload" action.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
