//! Run summary

use serde::Serialize;
use tracing::info;

/// Counts describing one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Collection rows handed to the pipeline
    pub rows_read: usize,
    /// Collection rows the reader could not use
    pub unreadable_rows: usize,
    /// Rows without a name or set
    pub incomplete_rows: usize,
    /// Rows rejected at normalization (prerelease-only products)
    pub rejected_rows: usize,
    /// Rows resolved from an earlier confirmation
    pub memo_hits: usize,
    /// Distinct keys confirmed against the reference catalog without review
    pub auto_confirmed: usize,
    /// Distinct keys confirmed against an authority-synthesized record
    pub authority_verified: usize,
    /// Distinct tokens confirmed without review
    pub tokens_confirmed: usize,
    /// Authority lookups performed
    pub authority_lookups: usize,
    /// Candidates synthesized from authority records
    pub synthesized: usize,
    /// Items queued for review
    pub deferred: usize,
    /// Review items confirmed
    pub review_confirmed: usize,
    /// Review items skipped or cancelled
    pub review_unmatched: usize,
    /// Review fell back to the alternate surface
    pub review_fell_back: bool,
    /// Scoring passes that found no exact collector-number match
    pub low_confidence_warnings: usize,
    /// Main stream entries after merging
    pub main_entries: usize,
    /// Authority-verified entries
    pub authority_entries: usize,
    /// Given-up entries
    pub given_up_entries: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            rows = self.rows_read,
            unreadable = self.unreadable_rows,
            incomplete = self.incomplete_rows,
            rejected = self.rejected_rows,
            "Collection processed"
        );
        info!(
            auto_confirmed = self.auto_confirmed,
            authority_verified = self.authority_verified,
            tokens = self.tokens_confirmed,
            memo_hits = self.memo_hits,
            authority_lookups = self.authority_lookups,
            synthesized = self.synthesized,
            low_confidence = self.low_confidence_warnings,
            "Matching complete"
        );
        info!(
            deferred = self.deferred,
            confirmed = self.review_confirmed,
            unmatched = self.review_unmatched,
            fell_back = self.review_fell_back,
            "Review complete"
        );
        info!(
            main = self.main_entries,
            authority = self.authority_entries,
            given_up = self.given_up_entries,
            "Entries built"
        );
    }
}
