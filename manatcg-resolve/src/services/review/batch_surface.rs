//! Unattended review

use super::{DecisionSurface, ReviewAction, ReviewPrompt, SurfaceError};

/// Resolves the whole batch with one answer on the first prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSurface {
    /// Accept every item's top candidate
    AutoTop,
    /// Leave every item unmatched
    SkipAll,
}

impl DecisionSurface for BatchSurface {
    fn name(&self) -> &'static str {
        match self {
            BatchSurface::AutoTop => "auto-top",
            BatchSurface::SkipAll => "skip-all",
        }
    }

    fn prompt(&mut self, _prompt: &ReviewPrompt<'_>) -> Result<ReviewAction, SurfaceError> {
        Ok(match self {
            BatchSurface::AutoTop => ReviewAction::AutoConfirmRemaining,
            BatchSurface::SkipAll => ReviewAction::CancelRemaining,
        })
    }
}
