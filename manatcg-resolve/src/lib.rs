//! manatcg-resolve library interface
//!
//! Resolves collection export rows to reference catalog records:
//! normalization, candidate scoring, authority verification, confidence
//! classification, deferred review and output entries.
//!
//! Exposed as a library so the binary and the integration tests share one
//! engine.

pub mod error;
pub mod io;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ResolveError, ResolveResult};

use crate::models::{ReferenceCatalog, ReferenceRecord};
use crate::services::KeyNormalizer;
use manatcg_common::config::AliasConfig;

/// Index reference records by their normalized keys
pub fn build_catalog(records: Vec<ReferenceRecord>, aliases: &AliasConfig) -> ReferenceCatalog {
    let normalizer = KeyNormalizer::new(aliases);
    ReferenceCatalog::build(records, |record| normalizer.normalize_record(record))
}
