//! Resolution workflow
//!
//! Wires the services into one run over a collection export:
//! - [`ResolutionContext`]: per-run memo, synthesized records, deferred queue
//! - [`Pipeline`]: scoring, verification, classification, review, entries
//! - [`RunSummary`]: counts logged at the end of a run

pub mod context;
pub mod pipeline;
pub mod summary;

pub use context::{DeferredItem, ReferenceSubset, ResolutionContext};
pub use pipeline::{Pipeline, ResolutionRun, RunOutput};
pub use summary::RunSummary;
