//! Output files
//!
//! Every file starts with the same header row, even when empty. The main
//! file is always written; the authority and given-up files only when they
//! have entries.

use crate::error::{ResolveError, ResolveResult};
use crate::models::{OutputEntry, OUTPUT_HEADERS};
use crate::workflow::RunSummary;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main stream file name
pub const MAIN_FILE: &str = "tcgplayer_staged_inventory.csv";

/// Authority-verified stream file name
pub const AUTHORITY_FILE: &str = "cards_missing_from_tcgplayer.csv";

/// Given-up stream file name
pub const GIVEN_UP_FILE: &str = "tcgplayer_given_up.csv";

/// Run summary file name
pub const SUMMARY_FILE: &str = "run_summary.json";

/// Paths of the files a run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub directory: PathBuf,
    pub main: PathBuf,
    pub authority: Option<PathBuf>,
    pub given_up: Option<PathBuf>,
}

/// Create `<base>/<prefix>_<YYYYmmdd_HHMMSS>`
pub fn create_output_dir(base: &Path, prefix: &str, now: DateTime<Local>) -> ResolveResult<PathBuf> {
    let directory = base.join(format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&directory)?;
    Ok(directory)
}

/// Write one stream as CSV
pub fn write_entries(path: &Path, entries: &[OutputEntry]) -> ResolveResult<()> {
    let csv_error = |source: csv::Error| ResolveError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;
    writer.write_record(OUTPUT_HEADERS).map_err(csv_error)?;
    for entry in entries {
        writer.serialize(entry).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write all three streams into `directory`
pub fn write_streams(
    directory: &Path,
    main: &[OutputEntry],
    authority: &[OutputEntry],
    given_up: &[OutputEntry],
) -> ResolveResult<OutputFiles> {
    let main_path = directory.join(MAIN_FILE);
    write_entries(&main_path, main)?;
    info!(path = %main_path.display(), entries = main.len(), "Wrote main output");

    let authority_path = write_optional(directory.join(AUTHORITY_FILE), authority, "authority-verified")?;
    let given_up_path = write_optional(directory.join(GIVEN_UP_FILE), given_up, "given-up")?;

    Ok(OutputFiles {
        directory: directory.to_path_buf(),
        main: main_path,
        authority: authority_path,
        given_up: given_up_path,
    })
}

/// Write the run summary as pretty-printed JSON
pub fn write_summary(directory: &Path, summary: &RunSummary) -> ResolveResult<PathBuf> {
    let path = directory.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::from)?;
    fs::write(&path, json)?;
    Ok(path)
}

fn write_optional(path: PathBuf, entries: &[OutputEntry], stream: &str) -> ResolveResult<Option<PathBuf>> {
    if entries.is_empty() {
        return Ok(None);
    }
    write_entries(&path, entries)?;
    info!(path = %path.display(), entries = entries.len(), stream, "Wrote output");
    Ok(Some(path))
}
