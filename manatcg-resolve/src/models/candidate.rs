//! Scored candidates

use super::record::RecordRef;

/// A reference record paired with its score for one query key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Scored record
    pub record: RecordRef,
    /// Additive score; higher is better, may be negative
    pub score: i32,
}

impl Candidate {
    pub fn new(record: RecordRef, score: i32) -> Self {
        Self { record, score }
    }
}

/// Low-confidence signal raised while scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreWarning {
    /// The query had a collector number but no candidate matched it exactly
    NoExactNumber { name: String, number: String },
}

/// Result of scoring one key against a set of reference records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// Candidates ordered by descending score, ties in discovery order
    pub candidates: Vec<Candidate>,
    /// True when the list was narrowed to exact collector-number matches
    pub exact_number_only: bool,
    /// Raised when no exact number match existed
    pub warning: Option<ScoreWarning>,
}

impl ScoreOutcome {
    /// Highest score, if any candidate exists
    pub fn top_score(&self) -> Option<i32> {
        self.candidates.first().map(|c| c.score)
    }

    /// Put an authority-backed candidate in front of all others
    pub fn insert_front(&mut self, candidate: Candidate) {
        self.candidates.insert(0, candidate);
    }
}
