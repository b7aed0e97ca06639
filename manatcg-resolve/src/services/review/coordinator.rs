//! Review Coordinator
//!
//! Walks the frozen deferred queue with a decision surface.
//!
//! **Guarantees:**
//! - Every item ends with exactly one decision
//! - Back revisits the previous item; its decision is replaced on the next action
//! - Auto-confirm and cancel apply to the current item and every item after it
//! - When the surface fails to start or fails mid-review, the fallback surface
//!   takes over at the first undecided item; without a fallback, the rest is
//!   cancelled

use super::{Decision, DecisionSurface, ReviewAction, ReviewItem, ReviewPrompt};
use tracing::{info, warn};

/// Decisions for a reviewed batch, one per item in queue order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Decision per item
    pub decisions: Vec<Decision>,
    /// The fallback surface was used
    pub fell_back: bool,
}

impl ReviewOutcome {
    /// Selected display index for item `idx`
    pub fn selection(&self, idx: usize) -> Option<usize> {
        self.decisions.get(idx).and_then(Decision::selection)
    }

    /// Number of confirmed items
    pub fn confirmed(&self) -> usize {
        self.decisions.iter().filter(|d| matches!(d, Decision::Confirmed(_))).count()
    }

    /// Number of skipped or cancelled items
    pub fn unmatched(&self) -> usize {
        self.decisions.len() - self.confirmed()
    }
}

/// Drives a decision surface over the deferred queue
pub struct ReviewCoordinator {
    primary: Box<dyn DecisionSurface>,
    fallback: Option<Box<dyn DecisionSurface>>,
}

impl ReviewCoordinator {
    pub fn new(primary: Box<dyn DecisionSurface>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Surface that takes over when the primary fails
    pub fn with_fallback(mut self, fallback: Box<dyn DecisionSurface>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Review every item and return one decision per item
    pub fn review(self, items: &[ReviewItem]) -> ReviewOutcome {
        let total = items.len();
        let ReviewCoordinator { primary, mut fallback } = self;
        let mut decisions: Vec<Option<Decision>> = vec![None; total];
        let mut fell_back = false;

        if total == 0 {
            return ReviewOutcome {
                decisions: Vec::new(),
                fell_back,
            };
        }

        info!(items = total, surface = primary.name(), "Starting review");

        let mut surface = primary;
        let mut running = match surface.open(total) {
            Ok(()) => true,
            Err(e) => {
                warn!(surface = surface.name(), error = %e, "Review surface failed to start");
                match switch_to_fallback(&mut surface, &mut fallback, total) {
                    Some(()) => {
                        fell_back = true;
                        true
                    }
                    None => false,
                }
            }
        };

        let mut position = 0;
        while running && position < total {
            let item = &items[position];
            let prompt = ReviewPrompt {
                item,
                position,
                total,
                previous: decisions[position],
            };

            match surface.prompt(&prompt) {
                Ok(ReviewAction::Confirm(choice)) => {
                    if choice < item.candidates.len() {
                        decisions[position] = Some(Decision::Confirmed(choice));
                        position += 1;
                    } else {
                        warn!(choice, candidates = item.candidates.len(), "Ignoring out-of-range selection");
                    }
                }
                Ok(ReviewAction::Skip) => {
                    decisions[position] = Some(Decision::Skipped);
                    position += 1;
                }
                Ok(ReviewAction::Back) => {
                    position = position.saturating_sub(1);
                }
                Ok(ReviewAction::AutoConfirmRemaining) => {
                    info!(items = total - position, "Auto-confirming remaining items");
                    for idx in position..total {
                        decisions[idx] = Some(if items[idx].candidates.is_empty() {
                            Decision::Skipped
                        } else {
                            Decision::Confirmed(0)
                        });
                    }
                    position = total;
                }
                Ok(ReviewAction::CancelRemaining) => {
                    info!(items = total - position, "Review cancelled for remaining items");
                    for decision in decisions.iter_mut().skip(position) {
                        *decision = Some(Decision::Cancelled);
                    }
                    position = total;
                }
                Err(e) => {
                    warn!(surface = surface.name(), error = %e, "Review surface failed");
                    match switch_to_fallback(&mut surface, &mut fallback, total) {
                        Some(()) => {
                            fell_back = true;
                            position = decisions.iter().position(Option::is_none).unwrap_or(total);
                        }
                        None => running = false,
                    }
                }
            }
        }

        surface.close();

        let decisions: Vec<Decision> = decisions
            .into_iter()
            .map(|d| d.unwrap_or(Decision::Cancelled))
            .collect();
        let outcome = ReviewOutcome { decisions, fell_back };
        info!(
            confirmed = outcome.confirmed(),
            unmatched = outcome.unmatched(),
            "Review finished"
        );
        outcome
    }
}

/// Replace the current surface with the fallback and open it
fn switch_to_fallback(
    surface: &mut Box<dyn DecisionSurface>,
    fallback: &mut Option<Box<dyn DecisionSurface>>,
    total: usize,
) -> Option<()> {
    let next = fallback.take()?;
    surface.close();
    *surface = next;
    info!(surface = surface.name(), "Continuing review on fallback surface");

    if let Err(e) = surface.open(total) {
        warn!(surface = surface.name(), error = %e, "Fallback surface failed to start");
        return None;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedKey;
    use crate::services::review::{CandidateView, SurfaceError};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted responses; records the positions it was asked about
    struct Scripted {
        responses: VecDeque<Result<ReviewAction, SurfaceError>>,
        fail_open: bool,
        seen: Arc<Mutex<Vec<usize>>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<ReviewAction, SurfaceError>>) -> (Self, Arc<Mutex<Vec<usize>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let surface = Self {
                responses: responses.into(),
                fail_open: false,
                seen: Arc::clone(&seen),
            };
            (surface, seen)
        }
    }

    impl DecisionSurface for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn open(&mut self, _total: usize) -> Result<(), SurfaceError> {
            if self.fail_open {
                return Err(SurfaceError::Unavailable("no terminal".to_string()));
            }
            Ok(())
        }

        fn prompt(&mut self, prompt: &ReviewPrompt<'_>) -> Result<ReviewAction, SurfaceError> {
            self.seen.lock().unwrap().push(prompt.position);
            self.responses.pop_front().unwrap_or(Err(SurfaceError::InputClosed))
        }
    }

    fn items(count: usize) -> Vec<ReviewItem> {
        (0..count)
            .map(|i| ReviewItem {
                key: NormalizedKey {
                    name: format!("card {}", i),
                    set_name: "set".to_string(),
                    collector_number: None,
                    condition: "near mint".to_string(),
                    name_suffix: String::new(),
                },
                candidates: vec![
                    CandidateView {
                        product_name: format!("Card {}", i),
                        set_name: "Set".to_string(),
                        number: "1".to_string(),
                        condition: "Near Mint".to_string(),
                        score: 250,
                        synthesized: false,
                    },
                    CandidateView {
                        product_name: format!("Card {} (Showcase)", i),
                        set_name: "Set".to_string(),
                        number: "2".to_string(),
                        condition: "Near Mint".to_string(),
                        score: 220,
                        synthesized: false,
                    },
                ],
                waiting_rows: 1,
            })
            .collect()
    }

    #[test]
    fn test_every_item_decided_once() {
        let (surface, _) = Scripted::new(vec![
            Ok(ReviewAction::Confirm(1)),
            Ok(ReviewAction::Skip),
            Ok(ReviewAction::Confirm(0)),
        ]);
        let outcome = ReviewCoordinator::new(Box::new(surface)).review(&items(3));

        assert_eq!(
            outcome.decisions,
            vec![Decision::Confirmed(1), Decision::Skipped, Decision::Confirmed(0)]
        );
        assert!(!outcome.fell_back);
    }

    #[test]
    fn test_auto_confirm_at_third_of_five() {
        let (surface, _) = Scripted::new(vec![
            Ok(ReviewAction::Skip),
            Ok(ReviewAction::Confirm(1)),
            Ok(ReviewAction::AutoConfirmRemaining),
        ]);
        let outcome = ReviewCoordinator::new(Box::new(surface)).review(&items(5));

        assert_eq!(outcome.selection(0), None);
        assert_eq!(outcome.selection(1), Some(1));
        for idx in 2..5 {
            assert_eq!(outcome.selection(idx), Some(0));
        }
    }

    #[test]
    fn test_back_replaces_previous_decision() {
        let (surface, seen) = Scripted::new(vec![
            Ok(ReviewAction::Confirm(0)),
            Ok(ReviewAction::Back),
            Ok(ReviewAction::Confirm(1)),
            Ok(ReviewAction::Skip),
        ]);
        let outcome = ReviewCoordinator::new(Box::new(surface)).review(&items(2));

        assert_eq!(outcome.decisions, vec![Decision::Confirmed(1), Decision::Skipped]);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_back_on_first_item_stays_put() {
        let (surface, seen) = Scripted::new(vec![Ok(ReviewAction::Back), Ok(ReviewAction::Skip)]);
        ReviewCoordinator::new(Box::new(surface)).review(&items(1));
        assert_eq!(*seen.lock().unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_cancel_marks_rest_unmatched() {
        let (surface, _) = Scripted::new(vec![Ok(ReviewAction::Confirm(0)), Ok(ReviewAction::CancelRemaining)]);
        let outcome = ReviewCoordinator::new(Box::new(surface)).review(&items(4));

        assert_eq!(outcome.confirmed(), 1);
        assert_eq!(&outcome.decisions[1..], &[Decision::Cancelled; 3]);
    }

    #[test]
    fn test_out_of_range_selection_reprompts() {
        let (surface, seen) = Scripted::new(vec![Ok(ReviewAction::Confirm(7)), Ok(ReviewAction::Confirm(1))]);
        let outcome = ReviewCoordinator::new(Box::new(surface)).review(&items(1));

        assert_eq!(outcome.decisions, vec![Decision::Confirmed(1)]);
        assert_eq!(*seen.lock().unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_fallback_when_primary_fails_to_open() {
        let (mut primary, primary_seen) = Scripted::new(vec![]);
        primary.fail_open = true;
        let (fallback, _) = Scripted::new(vec![Ok(ReviewAction::Confirm(0)), Ok(ReviewAction::Skip)]);

        let outcome = ReviewCoordinator::new(Box::new(primary))
            .with_fallback(Box::new(fallback))
            .review(&items(2));

        assert!(outcome.fell_back);
        assert!(primary_seen.lock().unwrap().is_empty());
        assert_eq!(outcome.decisions, vec![Decision::Confirmed(0), Decision::Skipped]);
    }

    #[test]
    fn test_fallback_resumes_at_first_undecided_item() {
        let (primary, _) = Scripted::new(vec![
            Ok(ReviewAction::Confirm(1)),
            Ok(ReviewAction::Confirm(0)),
            Err(SurfaceError::Unavailable("terminal lost".to_string())),
        ]);
        let (fallback, fallback_seen) = Scripted::new(vec![Ok(ReviewAction::Skip), Ok(ReviewAction::Confirm(1))]);

        let outcome = ReviewCoordinator::new(Box::new(primary))
            .with_fallback(Box::new(fallback))
            .review(&items(4));

        assert!(outcome.fell_back);
        assert_eq!(*fallback_seen.lock().unwrap(), vec![2, 3]);
        assert_eq!(
            outcome.decisions,
            vec![
                Decision::Confirmed(1),
                Decision::Confirmed(0),
                Decision::Skipped,
                Decision::Confirmed(1)
            ]
        );
    }

    #[test]
    fn test_failure_without_fallback_cancels_rest() {
        let (primary, _) = Scripted::new(vec![Ok(ReviewAction::Confirm(0))]);
        let outcome = ReviewCoordinator::new(Box::new(primary)).review(&items(3));

        assert_eq!(
            outcome.decisions,
            vec![Decision::Confirmed(0), Decision::Cancelled, Decision::Cancelled]
        );
    }

    #[test]
    fn test_empty_queue_never_opens_surface() {
        let (mut primary, seen) = Scripted::new(vec![]);
        primary.fail_open = true;
        let outcome = ReviewCoordinator::new(Box::new(primary)).review(&[]);

        assert!(outcome.decisions.is_empty());
        assert!(!outcome.fell_back);
        assert!(seen.lock().unwrap().is_empty());
    }
}
