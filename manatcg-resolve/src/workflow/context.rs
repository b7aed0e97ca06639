//! Resolution context
//!
//! Per-run state shared by the pipeline stages: confirmed matches,
//! authority-synthesized records and the deferred queue. One context is
//! created per run and dropped with it.

use crate::error::{ResolveError, ResolveResult};
use crate::models::{Candidate, NormalizedKey, RecordRef, ReferenceCatalog, ReferenceRecord};
use std::collections::HashMap;
use tracing::debug;

/// Reference rows a candidate list was scored against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceSubset {
    /// The whole catalog
    Catalog,
    /// Token rows of one token set
    Tokens { set_name: String },
}

/// An item waiting for review
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredItem {
    pub key: NormalizedKey,
    /// Ranked candidates, best first
    pub candidates: Vec<Candidate>,
    pub subset: ReferenceSubset,
    /// Indices of the prepared items resolved by this item's decision
    pub waiting: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct ResolutionContext {
    confirmed: HashMap<NormalizedKey, RecordRef>,
    synthesized: Vec<ReferenceRecord>,
    deferred: Vec<DeferredItem>,
    deferred_index: HashMap<(ReferenceSubset, NormalizedKey), usize>,
    frozen: bool,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoize a confirmed match
    pub fn confirm(&mut self, key: NormalizedKey, record: RecordRef) {
        debug!(key = %key, record = ?record, "Match confirmed");
        self.confirmed.insert(key, record);
    }

    /// Previously confirmed record for `key`
    pub fn confirmed(&self, key: &NormalizedKey) -> Option<RecordRef> {
        self.confirmed.get(key).copied()
    }

    /// Number of memoized matches
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }

    /// Add an authority-synthesized record to the pool
    pub fn add_synthesized(&mut self, record: ReferenceRecord) -> RecordRef {
        self.synthesized.push(record);
        RecordRef::Authority(self.synthesized.len() - 1)
    }

    /// Number of synthesized records
    pub fn synthesized_count(&self) -> usize {
        self.synthesized.len()
    }

    /// Resolve a handle against the catalog or the synthesized pool
    pub fn record<'a>(&'a self, catalog: &'a ReferenceCatalog, record: RecordRef) -> Option<&'a ReferenceRecord> {
        match record {
            RecordRef::Reference(idx) => catalog.get(idx),
            RecordRef::Authority(idx) => self.synthesized.get(idx),
        }
    }

    /// Queue `item` for review under `key`
    ///
    /// Items sharing a key and subset share one queue entry. Returns the
    /// entry's position.
    pub fn defer(
        &mut self,
        key: NormalizedKey,
        candidates: Vec<Candidate>,
        subset: ReferenceSubset,
        item: usize,
    ) -> ResolveResult<usize> {
        if self.frozen {
            return Err(ResolveError::QueueFrozen);
        }

        let index_key = (subset.clone(), key.clone());
        if let Some(&position) = self.deferred_index.get(&index_key) {
            self.deferred[position].waiting.push(item);
            return Ok(position);
        }

        let position = self.deferred.len();
        debug!(key = %key, candidates = candidates.len(), "Deferred for review");
        self.deferred.push(DeferredItem {
            key,
            candidates,
            subset,
            waiting: vec![item],
        });
        self.deferred_index.insert(index_key, position);
        Ok(position)
    }

    /// Stop accepting deferred items
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The deferred queue in enqueue order
    pub fn deferred(&self) -> &[DeferredItem] {
        &self.deferred
    }
}
