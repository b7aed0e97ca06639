//! Data models for manatcg-resolve
//!
//! Identity keys, reference records, collection rows, scored candidates and
//! output entries. Behavior lives in `services`; these types only carry data
//! between stages.

pub mod candidate;
pub mod entry;
pub mod key;
pub mod record;
pub mod source;

pub use candidate::{Candidate, ScoreOutcome, ScoreWarning};
pub use entry::{EntryStream, OutputEntry, AUTHORITY_VERIFIED_ID, NOT_FOUND_ID, OUTPUT_HEADERS};
pub use key::NormalizedKey;
pub use record::{CatalogEntry, PriceFields, RecordOrigin, RecordRef, ReferenceCatalog, ReferenceRecord};
pub use source::SourceRow;
