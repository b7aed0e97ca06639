//! CSV ingestion and output
//!
//! - Reference dataset: filtered, rows without a set name discarded
//! - Collection export: malformed rows skipped with a warning
//! - Output streams: one CSV per stream in a timestamped directory, plus a
//!   JSON run summary

pub mod collection_reader;
pub mod output_writer;
pub mod reference_loader;

pub use collection_reader::{read_collection, LoadedCollection};
pub use output_writer::{create_output_dir, write_entries, write_streams, write_summary, OutputFiles};
pub use reference_loader::{load_reference, LoadedReference};
