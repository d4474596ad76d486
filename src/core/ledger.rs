//! Per-row height ledger for the card deck.
//!
//! The deck renders rows it has measured; rows it has not measured yet (or
//! that were swiped away) must not contribute to scroll geometry.  The ledger
//! keeps one slot per row — indices stay stable for the lifetime of the deck,
//! so a removed row keeps its slot and is simply skipped everywhere.

// ───────────────────────────────────────── slots ─────────────

/// One row's entry in the ledger.
#[derive(Debug, Clone, Default)]
pub struct RowSlot {
    /// Measured height in rows.  `None` until the row has been laid out.
    height: Option<f64>,
    /// Set once the row has been dismissed; never cleared.
    removed: bool,
}

// ───────────────────────────────────────── ledger ────────────

/// Height bookkeeping for every row of the deck, removed rows included.
#[derive(Debug, Clone, Default)]
pub struct HeightLedger {
    slots: Vec<RowSlot>,
}

impl HeightLedger {
    /// Ledger with `len` unmeasured rows.
    pub fn with_rows(len: usize) -> Self {
        Self {
            slots: vec![RowSlot::default(); len],
        }
    }

    /// Replace the row population, dropping all measurements and removals.
    pub fn reset(&mut self, len: usize) {
        self.slots.clear();
        self.slots.resize(len, RowSlot::default());
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record a measurement.  Returns `true` when the stored height actually
    /// changed (callers re-derive geometry only in that case).  Out-of-range
    /// indices and removed rows are ignored.
    pub fn record_height(&mut self, index: usize, height: f64) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.removed || slot.height == Some(height) {
            return false;
        }
        slot.height = Some(height);
        true
    }

    /// Mark a row as removed.  Returns `false` if it already was (dismissal
    /// must be idempotent per row) or the index is out of range.
    pub fn mark_removed(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.removed {
            return false;
        }
        slot.removed = true;
        true
    }

    pub fn is_removed(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.removed)
    }

    /// Measured height of an active row, `None` for unmeasured, removed or
    /// out-of-range rows.
    pub fn height(&self, index: usize) -> Option<f64> {
        let slot = self.slots.get(index)?;
        if slot.removed {
            None
        } else {
            slot.height
        }
    }

    /// Height a row contributes to geometry: its measurement, or `0.0` when
    /// it has none to give.
    pub fn effective_height(&self, index: usize) -> f64 {
        self.height(index).unwrap_or(0.0)
    }

    /// True when the row participates in geometry (measured and present).
    pub fn is_active(&self, index: usize) -> bool {
        self.height(index).is_some()
    }

    /// Total scrollable content length: the sum of all effective heights.
    pub fn content_len(&self) -> f64 {
        (0..self.slots.len())
            .map(|i| self.effective_height(i))
            .sum()
    }

    /// Number of rows still present (removed rows excluded, unmeasured ones
    /// counted — they exist, they just have no height yet).
    pub fn active_rows(&self) -> usize {
        self.slots.iter().filter(|s| !s.removed).count()
    }

    /// Highest-indexed active row, if any.  After a dismissal this tells the
    /// deck whether the removed row used to be the last one standing.
    pub fn last_active_row(&self) -> Option<usize> {
        (0..self.slots.len()).rev().find(|&i| !self.slots[i].removed)
    }

    /// Iterate `(index, height)` over active measured rows in order.
    pub fn active_heights(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match (s.removed, s.height) {
                (false, Some(h)) => Some((i, h)),
                _ => None,
            })
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmeasured_rows_contribute_zero() {
        let mut ledger = HeightLedger::with_rows(3);
        ledger.record_height(1, 40.0);
        assert_eq!(ledger.effective_height(0), 0.0);
        assert_eq!(ledger.effective_height(1), 40.0);
        assert_eq!(ledger.content_len(), 40.0);
    }

    #[test]
    fn record_reports_change_only() {
        let mut ledger = HeightLedger::with_rows(2);
        assert!(ledger.record_height(0, 24.0));
        assert!(!ledger.record_height(0, 24.0));
        assert!(ledger.record_height(0, 48.0));
        assert!(!ledger.record_height(9, 48.0));
    }

    #[test]
    fn removal_is_sticky_and_idempotent() {
        let mut ledger = HeightLedger::with_rows(3);
        ledger.record_height(1, 40.0);
        assert!(ledger.mark_removed(1));
        assert!(!ledger.mark_removed(1));
        assert_eq!(ledger.height(1), None);
        assert_eq!(ledger.content_len(), 0.0);
        // The slot survives: indices of later rows are unaffected.
        assert_eq!(ledger.len(), 3);
        assert!(!ledger.record_height(1, 99.0));
    }

    #[test]
    fn last_active_skips_removed_tail() {
        let mut ledger = HeightLedger::with_rows(3);
        ledger.mark_removed(2);
        assert_eq!(ledger.last_active_row(), Some(1));
        ledger.mark_removed(1);
        ledger.mark_removed(0);
        assert_eq!(ledger.last_active_row(), None);
    }
}
