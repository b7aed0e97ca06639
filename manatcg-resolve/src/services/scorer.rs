//! Candidate Scorer
//!
//! Ranks reference records against one query key by an additive score.
//!
//! **Score components (in order):**
//! 1. Base: name similarity ratio, 0-100
//! 2. Substring bonus when one name contains the other
//! 3. Set bonus when normalized set names are equal
//! 4. Collector number: bonus when either side is unknown, larger bonus when
//!    equal, penalty when different
//! 5. Condition rank distance, with "foil" stripped before ranking
//! 6. Records naming a prerelease product or prerelease card set are excluded
//! 7. Special-print penalty for each term present on exactly one side
//!
//! When any candidate matched the collector number exactly, only exact matches
//! are returned. Ordering is descending by score; ties keep discovery order.

use crate::models::{
    CatalogEntry, Candidate, NormalizedKey, RecordRef, ReferenceCatalog, ReferenceRecord,
    ScoreOutcome, ScoreWarning,
};
use manatcg_common::config::{MatchPolicy, PruneStrictness};
use std::collections::HashSet;
use tracing::warn;

/// Ordinal rank of a condition string, "foil" already stripped
pub fn condition_rank(condition: &str) -> Option<i32> {
    match condition {
        "near mint" => Some(0),
        "lightly played" => Some(1),
        "moderately played" => Some(2),
        "heavily played" => Some(3),
        "damaged" => Some(4),
        _ => None,
    }
}

/// Name similarity as an integer percentage
///
/// Indel ratio: `2 * lcs / (len_a + len_b)` over characters, so a name that
/// is contained in a longer one keeps most of its weight. Two empty names are
/// identical.
pub fn similarity_ratio(a: &str, b: &str) -> i32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }

    let common = longest_common_subsequence(&a, &b);
    (200.0 * common as f64 / total as f64).round() as i32
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Candidate scorer
pub struct CandidateScorer {
    policy: MatchPolicy,
}

impl CandidateScorer {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    /// Score a key against every record of the catalog
    pub fn score_catalog(&self, key: &NormalizedKey, catalog: &ReferenceCatalog) -> ScoreOutcome {
        self.score(key, catalog.entries())
    }

    /// Score a key against the given catalog rows
    pub fn score<'a, I>(&self, key: &NormalizedKey, entries: I) -> ScoreOutcome
    where
        I: IntoIterator<Item = CatalogEntry<'a>>,
    {
        let mut candidates = Vec::new();
        let mut exact = Vec::new();

        for entry in entries {
            if self.pruned(&key.name, &entry.key.name) {
                continue;
            }
            if is_prerelease_record(entry.record) {
                continue;
            }

            let (score, number_matched) = self.score_pair(key, entry.key);
            let candidate = Candidate::new(RecordRef::Reference(entry.index), score);
            candidates.push(candidate);
            if number_matched {
                exact.push(candidate);
            }
        }

        let mut warning = None;
        let exact_number_only = !exact.is_empty();
        if exact_number_only {
            candidates = exact;
        } else if !candidates.is_empty() {
            if let Some(number) = &key.collector_number {
                warn!(
                    name = %key.name,
                    number = %number,
                    "No exact collector number match; showing closest variants"
                );
                warning = Some(ScoreWarning::NoExactNumber {
                    name: key.name.clone(),
                    number: number.clone(),
                });
            }
        }

        // Stable sort keeps discovery order among equal scores
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        ScoreOutcome {
            candidates,
            exact_number_only,
            warning,
        }
    }

    /// Score one pair of keys; the flag reports an exact number match
    pub fn score_pair(&self, query: &NormalizedKey, candidate: &NormalizedKey) -> (i32, bool) {
        let w = &self.policy.weights;
        let mut score = similarity_ratio(&query.name, &candidate.name);

        if candidate.name.contains(query.name.as_str()) || query.name.contains(candidate.name.as_str()) {
            score += w.substring_bonus;
        }
        if query.set_name == candidate.set_name {
            score += w.set_match_bonus;
        }

        let mut number_matched = false;
        match (&query.collector_number, &candidate.collector_number) {
            (Some(q), Some(c)) if q == c => {
                score += w.number_match_bonus;
                number_matched = true;
            }
            (Some(_), Some(_)) => score -= w.number_mismatch_penalty,
            _ => score += w.number_unknown_bonus,
        }

        score += self.condition_adjustment(&query.condition, &candidate.condition);
        score -= self.special_print_penalty(query, candidate);

        (score, number_matched)
    }

    fn condition_adjustment(&self, query: &str, candidate: &str) -> i32 {
        let w = &self.policy.weights;
        let q = query.replace("foil", "");
        let c = candidate.replace("foil", "");

        match (condition_rank(q.trim()), condition_rank(c.trim())) {
            (Some(a), Some(b)) => match (a - b).abs() {
                0 => w.condition_same_bonus,
                1 => -w.condition_adjacent_penalty,
                _ => -w.condition_far_penalty,
            },
            _ if query != candidate => -w.condition_unknown_penalty,
            _ => 0,
        }
    }

    /// Terms are looked up in name, suffix and condition text on both sides
    fn special_print_penalty(&self, query: &NormalizedKey, candidate: &NormalizedKey) -> i32 {
        let q = print_text(query);
        let c = print_text(candidate);

        self.policy
            .special_print_penalties
            .iter()
            .filter(|(term, _)| q.contains(term.as_str()) != c.contains(term.as_str()))
            .map(|(_, penalty)| *penalty)
            .sum()
    }

    /// True when the candidate should not be scored at all
    fn pruned(&self, query: &str, candidate: &str) -> bool {
        if query.is_empty() || candidate.is_empty() {
            return false;
        }

        let same_initial = query.chars().next() == candidate.chars().next();
        let q_words: Vec<&str> = query.split_whitespace().collect();
        let c_words: Vec<&str> = candidate.split_whitespace().collect();

        match self.policy.prune {
            PruneStrictness::Off => false,
            PruneStrictness::Standard => {
                if q_words.len() == 1 && c_words.len() == 1 {
                    return false;
                }
                !same_initial && !shares_word(&q_words, &c_words)
            }
            PruneStrictness::Strict => {
                if !same_initial {
                    return true;
                }
                match (q_words.len(), c_words.len()) {
                    (1, 1) => q_words[0] != c_words[0],
                    (q, c) if q > 1 && c > 1 => !shares_word(&q_words, &c_words),
                    _ => false,
                }
            }
        }
    }
}

fn shares_word(a: &[&str], b: &[&str]) -> bool {
    let a: HashSet<&str> = a.iter().copied().collect();
    b.iter().any(|w| a.contains(w))
}

/// Text searched for special-print terms
///
/// Covers the condition as well as name and suffix, so a foil row counts as
/// foil even when the card name carries no marker.
fn print_text(key: &NormalizedKey) -> String {
    format!("{} {} {}", key.name, key.name_suffix, key.condition)
}

/// Records for prerelease products or prerelease card pools are never candidates
pub fn is_prerelease_record(record: &ReferenceRecord) -> bool {
    record.product_name.to_lowercase().contains("prerelease")
        || record.set_name.to_lowercase().contains("prerelease cards")
}
