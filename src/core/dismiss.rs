//! Swipe-dismiss sequencing.
//!
//! Removing a card is a chain of animation stages followed by bookkeeping
//! and a compensating scroll.  Instead of nesting completion callbacks, the
//! chain is a named phase sequence advanced by one driver — tests feed it
//! completion signals without a real animation clock.

use crate::core::ledger::HeightLedger;

/// Stages of one card's removal, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissPhase {
    /// The card's own removal animation is playing.
    Shrinking,
    /// The card is folding flat; the deck below has not moved yet.
    Settling,
    /// Ledger marked, dismissal persisted.
    Removed,
    /// Compensating scroll issued; the run is finished.
    Scrolled,
}

/// One in-flight dismissal.
#[derive(Debug, Clone)]
pub struct DismissRun {
    pub index: usize,
    pub phase: DismissPhase,
    /// Whether the row was the highest-indexed active row when the run
    /// began — decided before removal, it picks the compensating scroll.
    pub was_last_active: bool,
    /// The current card's top, captured when the run began.
    pub card_top: f64,
}

impl DismissRun {
    /// Start a run for `index`.  The last-active decision is taken now,
    /// while the row still counts as active.
    pub fn begin(ledger: &HeightLedger, index: usize, card_top: f64) -> Self {
        Self {
            index,
            phase: DismissPhase::Shrinking,
            was_last_active: ledger.last_active_row() == Some(index),
            card_top,
        }
    }

    /// Move to the next phase and return it.  `Scrolled` is terminal.
    pub fn advance(&mut self) -> DismissPhase {
        self.phase = match self.phase {
            DismissPhase::Shrinking => DismissPhase::Settling,
            DismissPhase::Settling => DismissPhase::Removed,
            DismissPhase::Removed | DismissPhase::Scrolled => DismissPhase::Scrolled,
        };
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == DismissPhase::Scrolled
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(heights: &[f64]) -> HeightLedger {
        let mut ledger = HeightLedger::with_rows(heights.len());
        for (i, &h) in heights.iter().enumerate() {
            ledger.record_height(i, h);
        }
        ledger
    }

    #[test]
    fn phases_run_in_order_and_terminate() {
        let ledger = ledger(&[100.0, 100.0]);
        let mut run = DismissRun::begin(&ledger, 0, 0.0);
        assert_eq!(run.phase, DismissPhase::Shrinking);
        assert_eq!(run.advance(), DismissPhase::Settling);
        assert_eq!(run.advance(), DismissPhase::Removed);
        assert_eq!(run.advance(), DismissPhase::Scrolled);
        assert!(run.is_finished());
        assert_eq!(run.advance(), DismissPhase::Scrolled);
    }

    #[test]
    fn last_active_decision_ignores_already_removed_tail() {
        let mut ledger = ledger(&[100.0, 100.0, 100.0]);
        assert!(!DismissRun::begin(&ledger, 1, 100.0).was_last_active);
        assert!(DismissRun::begin(&ledger, 2, 200.0).was_last_active);
        // With row 2 gone, row 1 is the deck's last row.
        ledger.mark_removed(2);
        assert!(DismissRun::begin(&ledger, 1, 100.0).was_last_active);
    }
}
