//! Confidence Classifier
//!
//! Decides whether a ranked candidate list is confident enough to accept
//! without review.
//!
//! **Rules (default policy):**
//! - Reference top candidate: accept at >= 270, or at >= 260 when it leads the
//!   runner-up by >= 30 (a missing runner-up counts as 0)
//! - Authority-synthesized top candidate: accept at >= 350 only
//! - Token path: accept at >= 250
//! - Empty list: reject
//! - Anything else: defer to review

use crate::models::{Candidate, RecordRef};
use manatcg_common::config::MatchPolicy;

/// Which rule accepted a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmRule {
    /// Top score at or above the auto-confirm threshold
    Threshold,
    /// Top score at or above the margin threshold with a clear lead
    Margin,
    /// Authority-synthesized candidate at or above the authority floor
    AuthorityFloor,
    /// Token candidate at or above the token threshold
    Token,
}

/// Classifier verdict for one candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Accept the candidate without review
    AutoConfirm { candidate: Candidate, rule: ConfirmRule },
    /// Queue for review
    Defer,
    /// No candidates at all
    Reject,
}

/// Stateless classifier over the match policy
pub struct ConfidenceClassifier {
    auto_confirm_score: i32,
    margin_confirm_score: i32,
    margin: i32,
    authority_floor: i32,
    token_confirm_score: i32,
}

impl ConfidenceClassifier {
    pub fn new(policy: &MatchPolicy) -> Self {
        Self {
            auto_confirm_score: policy.auto_confirm_score,
            margin_confirm_score: policy.margin_confirm_score,
            margin: policy.margin,
            authority_floor: policy.authority_floor,
            token_confirm_score: policy.token_confirm_score,
        }
    }

    /// Classify a list ordered by descending score
    pub fn classify(&self, candidates: &[Candidate]) -> Classification {
        let Some(top) = candidates.first().copied() else {
            return Classification::Reject;
        };

        if let RecordRef::Authority(_) = top.record {
            return if top.score >= self.authority_floor {
                Classification::AutoConfirm {
                    candidate: top,
                    rule: ConfirmRule::AuthorityFloor,
                }
            } else {
                Classification::Defer
            };
        }

        if top.score >= self.auto_confirm_score {
            return Classification::AutoConfirm {
                candidate: top,
                rule: ConfirmRule::Threshold,
            };
        }

        let runner_up = candidates.get(1).map(|c| c.score).unwrap_or(0);
        if top.score >= self.margin_confirm_score && top.score - runner_up >= self.margin {
            return Classification::AutoConfirm {
                candidate: top,
                rule: ConfirmRule::Margin,
            };
        }

        Classification::Defer
    }

    /// Classify a token candidate list
    pub fn classify_token(&self, candidates: &[Candidate]) -> Classification {
        match candidates.first().copied() {
            None => Classification::Reject,
            Some(top) if top.score >= self.token_confirm_score => Classification::AutoConfirm {
                candidate: top,
                rule: ConfirmRule::Token,
            },
            Some(_) => Classification::Defer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ConfidenceClassifier {
        ConfidenceClassifier::new(&MatchPolicy::default())
    }

    fn reference(scores: &[i32]) -> Vec<Candidate> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| Candidate::new(RecordRef::Reference(i), *s))
            .collect()
    }

    #[test]
    fn test_threshold_accepts() {
        let c = classifier();
        assert!(matches!(
            c.classify(&reference(&[270, 269])),
            Classification::AutoConfirm { rule: ConfirmRule::Threshold, .. }
        ));
    }

    #[test]
    fn test_margin_rule_boundaries() {
        let c = classifier();
        assert!(matches!(
            c.classify(&reference(&[265, 235])),
            Classification::AutoConfirm { rule: ConfirmRule::Margin, .. }
        ));
        assert_eq!(c.classify(&reference(&[265, 240])), Classification::Defer);
        assert_eq!(c.classify(&reference(&[259, 0])), Classification::Defer);
    }

    #[test]
    fn test_single_candidate_uses_zero_runner_up() {
        assert!(matches!(
            classifier().classify(&reference(&[260])),
            Classification::AutoConfirm { rule: ConfirmRule::Margin, .. }
        ));
    }

    #[test]
    fn test_empty_list_rejected() {
        assert_eq!(classifier().classify(&[]), Classification::Reject);
        assert_eq!(classifier().classify_token(&[]), Classification::Reject);
    }

    #[test]
    fn test_synthesized_candidate_needs_authority_floor() {
        let c = classifier();
        let below = [Candidate::new(RecordRef::Authority(0), 349)];
        let at = [Candidate::new(RecordRef::Authority(0), 350)];

        // 349 would pass both reference rules; synthesized records do not use them
        assert_eq!(c.classify(&below), Classification::Defer);
        assert!(matches!(
            c.classify(&at),
            Classification::AutoConfirm { rule: ConfirmRule::AuthorityFloor, .. }
        ));
    }

    #[test]
    fn test_token_threshold() {
        let c = classifier();
        assert!(matches!(
            c.classify_token(&reference(&[250])),
            Classification::AutoConfirm { rule: ConfirmRule::Token, .. }
        ));
        assert_eq!(c.classify_token(&reference(&[249])), Classification::Defer);
    }
}
