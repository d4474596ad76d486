//! Current-card resolution: which card owns a given scroll offset.
//!
//! Geometry is derived, never stored.  Each query walks the ledger from the
//! top, accumulating card boundaries, and applies a directional stopping rule
//! so that a card straddling the viewport edge resolves differently on the
//! way down than on the way up.

use crate::core::ledger::HeightLedger;

// ───────────────────────────────────────── card window ───────

/// A card's vertical extent in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CardWindow {
    pub index: usize,
    pub top: f64,
    pub bottom: f64,
}

impl CardWindow {
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// The scroll offset at which the card's bottom aligns with the
    /// viewport's bottom edge.  A card shorter than the viewport pins to its
    /// own top instead of a point above it.
    pub fn effective_bottom(&self, viewport_h: f64) -> f64 {
        (self.bottom - viewport_h).max(self.top)
    }

    /// True when the card is taller than the viewport (an expanded card).
    pub fn overflows(&self, viewport_h: f64) -> bool {
        self.height() > viewport_h
    }
}

// ───────────────────────────────────────── resolution ────────

/// Resolve the card owning `offset`.
///
/// Rows without a usable height (unmeasured or removed) are skipped and
/// contribute nothing.  Scrolling down, the walk stops at the first card with
/// `offset <= (bottom - viewport_h) + margin`; scrolling up, at the first
/// with `offset < bottom - margin`.  If no card satisfies the rule the
/// bottom-most candidate stands, and an empty deck resolves to a zero window
/// at index 0.
pub fn resolve(
    ledger: &HeightLedger,
    viewport_h: f64,
    offset: f64,
    scrolling_down: bool,
    margin: f64,
) -> CardWindow {
    let mut win = CardWindow::default();
    let mut bottom = 0.0;
    for (index, height) in ledger.active_heights() {
        let top = bottom;
        bottom += height;
        win = CardWindow { index, top, bottom };
        let stop = if scrolling_down {
            offset <= (bottom - viewport_h) + margin
        } else {
            offset < bottom - margin
        };
        if stop {
            break;
        }
    }
    win
}

/// The window of one specific row, if it is measured and present.
pub fn window_of(ledger: &HeightLedger, index: usize) -> Option<CardWindow> {
    let mut bottom = 0.0;
    for (i, height) in ledger.active_heights() {
        let top = bottom;
        bottom += height;
        if i == index {
            return Some(CardWindow { index, top, bottom });
        }
        if i > index {
            break;
        }
    }
    None
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
    fn expanded_card_owns_the_offsets_it_covers() {
        let ledger = ledger(&[100.0, 300.0, 100.0]);
        let win = resolve(&ledger, 100.0, 100.0, true, 0.0);
        assert_eq!(
            win,
            CardWindow {
                index: 1,
                top: 100.0,
                bottom: 400.0
            }
        );
        assert_eq!(resolve(&ledger, 100.0, 250.0, true, 0.0).index, 1);
    }

    #[test]
    fn resolved_index_is_monotonic_in_offset() {
        let ledger = ledger(&[100.0, 300.0, 100.0]);
        let mut prev = 0;
        let mut offset = 0.0;
        while offset <= 500.0 {
            let index = resolve(&ledger, 100.0, offset, true, 0.0).index;
            assert!(index >= prev, "index regressed at offset {offset}");
            prev = index;
            offset += 10.0;
        }
    }

    #[test]
    fn upward_rule_releases_the_card_below_its_top() {
        let ledger = ledger(&[100.0, 300.0, 100.0]);
        assert_eq!(resolve(&ledger, 100.0, 100.0, false, 0.0).index, 1);
        assert_eq!(resolve(&ledger, 100.0, 99.9, false, 0.0).index, 0);
    }

    #[test]
    fn walk_skips_unmeasured_and_removed_rows() {
        let mut ledger = ledger(&[100.0, 100.0, 100.0]);
        ledger.mark_removed(1);
        let win = resolve(&ledger, 100.0, 150.0, true, 0.0);
        assert_eq!(
            win,
            CardWindow {
                index: 2,
                top: 100.0,
                bottom: 200.0
            }
        );
    }

    #[test]
    fn past_the_end_falls_back_to_the_last_card() {
        let ledger = ledger(&[100.0, 100.0]);
        assert_eq!(resolve(&ledger, 100.0, 900.0, true, 0.0).index, 1);
        assert_eq!(resolve(&ledger, 100.0, -5.0, false, 0.0).index, 0);
    }

    #[test]
    fn empty_deck_resolves_to_a_zero_window() {
        let ledger = HeightLedger::with_rows(0);
        assert_eq!(resolve(&ledger, 100.0, 40.0, true, 0.0), CardWindow::default());
    }

    #[test]
    fn effective_bottom_is_a_scroll_offset() {
        let tall = CardWindow {
            index: 1,
            top: 100.0,
            bottom: 400.0,
        };
        assert_eq!(tall.effective_bottom(100.0), 300.0);
        assert!(tall.overflows(100.0));
        // Shorter than the viewport: pins to the card top.
        let short = CardWindow {
            index: 0,
            top: 100.0,
            bottom: 160.0,
        };
        assert_eq!(short.effective_bottom(100.0), 100.0);
    }

    #[test]
    fn window_of_reports_boundaries_for_active_rows() {
        let mut ledger = ledger(&[100.0, 100.0, 100.0]);
        assert_eq!(
            window_of(&ledger, 2),
            Some(CardWindow {
                index: 2,
                top: 200.0,
                bottom: 300.0
            })
        );
        ledger.mark_removed(2);
        assert_eq!(window_of(&ledger, 2), None);
    }
}
