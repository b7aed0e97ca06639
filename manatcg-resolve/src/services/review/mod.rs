//! Deferred review
//!
//! Items the classifier could not accept are collected during resolution and
//! presented in one batch once resolution finishes. A [`ReviewCoordinator`]
//! owns the position and the decisions; a [`DecisionSurface`] only shows one
//! item and reports what the operator did.
//!
//! **Surfaces:**
//! - [`TerminalSurface`]: full-screen terminal UI
//! - [`TextPromptSurface`]: line prompts, also the fallback for the terminal UI
//! - [`BatchSurface`]: unattended, confirms the top candidate or skips all

pub mod batch_surface;
pub mod coordinator;
pub mod terminal_surface;
pub mod text_surface;

pub use batch_surface::BatchSurface;
pub use coordinator::{ReviewCoordinator, ReviewOutcome};
pub use terminal_surface::TerminalSurface;
pub use text_surface::TextPromptSurface;

use crate::models::NormalizedKey;
use thiserror::Error;

/// Decision surface errors
///
/// Never surfaced past the coordinator: a failing surface is replaced by the
/// fallback, or the remaining items are cancelled.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface unavailable: {0}")]
    Unavailable(String),

    #[error("Input closed")]
    InputClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One candidate as shown to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateView {
    /// Product name
    pub product_name: String,
    /// Set name
    pub set_name: String,
    /// Collector number
    pub number: String,
    /// Listed condition
    pub condition: String,
    /// Candidate score
    pub score: i32,
    /// Synthesized from the authority rather than listed in the catalog
    pub synthesized: bool,
}

/// One deferred item as shown to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    /// The item's normalized key
    pub key: NormalizedKey,
    /// Ranked candidates, best first, capped at the display limit
    pub candidates: Vec<CandidateView>,
    /// Number of collection rows resolved by this decision
    pub waiting_rows: usize,
}

/// What the operator did with the current item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Accept the candidate at this display index
    Confirm(usize),
    /// Leave this item unmatched
    Skip,
    /// Accept every remaining item's top candidate
    AutoConfirmRemaining,
    /// Leave every remaining item unmatched
    CancelRemaining,
    /// Revisit the previous item
    Back,
}

/// Final decision for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Candidate at this display index accepted
    Confirmed(usize),
    /// Skipped by the operator
    Skipped,
    /// Cancelled, or never reached because the review ended early
    Cancelled,
}

impl Decision {
    /// Selected display index, if confirmed
    pub fn selection(&self) -> Option<usize> {
        match self {
            Decision::Confirmed(idx) => Some(*idx),
            Decision::Skipped | Decision::Cancelled => None,
        }
    }
}

/// Everything a surface needs to show the current item
#[derive(Debug, Clone, Copy)]
pub struct ReviewPrompt<'a> {
    /// Item under review
    pub item: &'a ReviewItem,
    /// Zero-based position
    pub position: usize,
    /// Number of items in the batch
    pub total: usize,
    /// Decision made earlier for this item, when revisited
    pub previous: Option<Decision>,
}

/// A way of asking the operator about deferred items
pub trait DecisionSurface: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Prepare the surface for a batch of `total` items
    fn open(&mut self, total: usize) -> Result<(), SurfaceError> {
        let _ = total;
        Ok(())
    }

    /// Show one item and wait for the operator
    fn prompt(&mut self, prompt: &ReviewPrompt<'_>) -> Result<ReviewAction, SurfaceError>;

    /// Release the surface; called once, also after errors
    fn close(&mut self) {}
}
