//! Paging decisions: where the deck settles when a drag ends.
//!
//! A released drag either snaps to a card edge or — inside an expanded card,
//! for slow drags only — leaves the offset alone so the user can read tall
//! content.  Fast flicks always page.  The companion overscroll check pulls
//! free-scrolled offsets back inside the current card's boundaries.

use crate::core::ledger::HeightLedger;
use crate::core::resolver::{resolve, CardWindow};

/// Release speed (rows/ms) above which a drag is a flick: no margin, no
/// free-scroll exemption.
pub const SNAP_VELOCITY: f64 = 1.0;

/// Fraction of the viewport a slow drag must travel past a boundary before
/// the deck pages instead of snapping back.
pub const SLOW_DRAG_MARGIN_RATIO: f64 = 0.25;

// ───────────────────────────────────────── decision ──────────

/// What a finished drag resolved to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagingOutcome {
    /// The card now considered current.
    pub window: CardWindow,
    /// Snap destination, or `None` to leave the offset where the drag ended.
    pub target: Option<f64>,
}

/// Decide the post-drag settle point.
///
/// `prev_index` is the card that was current when the drag began.  Returns
/// `None` when there is nothing to page over (empty deck, unmeasured
/// viewport); refresh gating is the caller's business.
pub fn decide(
    ledger: &HeightLedger,
    viewport_h: f64,
    prev_index: usize,
    start_offset: f64,
    end_offset: f64,
    velocity: f64,
) -> Option<PagingOutcome> {
    if viewport_h <= 0.0 || ledger.is_empty() {
        return None;
    }
    let content_len = ledger.content_len();
    // Offsets outside the content entirely belong to whatever gesture put
    // them there (refresh pulls); paging keeps its hands off.
    if end_offset < 0.0 || end_offset > content_len {
        return None;
    }
    let dy = end_offset - start_offset;
    let scrolling_down = dy >= 0.0 || velocity >= 0.0;
    let margin = if velocity.abs() > SNAP_VELOCITY {
        0.0
    } else {
        viewport_h * SLOW_DRAG_MARGIN_RATIO
    };
    let window = resolve(ledger, viewport_h, end_offset, scrolling_down, margin);

    // A slow drag parked inside a taller-than-viewport card scrolls freely;
    // the margin widens the zone so a card edge does not grab the offset the
    // moment it peeks in.
    if margin > 0.0 && window.overflows(viewport_h) {
        let lo = window.top - margin;
        let hi = window.effective_bottom(viewport_h) + margin;
        if end_offset >= lo && end_offset <= hi {
            return Some(PagingOutcome {
                window,
                target: None,
            });
        }
    }

    // Same card: push toward the far edge in the travel direction.  New
    // card: land on its near edge.
    let raw = if window.index == prev_index {
        if scrolling_down {
            window.effective_bottom(viewport_h)
        } else {
            window.top
        }
    } else if scrolling_down {
        window.top
    } else {
        window.effective_bottom(viewport_h)
    };
    let max = (content_len - viewport_h).max(0.0);
    Some(PagingOutcome {
        window,
        target: Some(raw.clamp(0.0, max)),
    })
}

// ───────────────────────────────────────── overscroll ────────

/// Pull a free-scrolled offset back inside the current card.
///
/// Only meaningful while the current card is taller than the viewport —
/// collapsed cards are paging's business.  Returns the corrected offset, or
/// `None` when the offset already sits inside the card.
pub fn correct_overscroll(current: &CardWindow, viewport_h: f64, offset: f64) -> Option<f64> {
    if viewport_h <= 0.0 || !current.overflows(viewport_h) {
        return None;
    }
    let floor = current.effective_bottom(viewport_h);
    if offset > floor {
        return Some(floor);
    }
    if offset < current.top {
        return Some(current.top);
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
    fn slow_drag_free_scrolls_inside_expanded_card() {
        let ledger = ledger(&[100.0, 300.0, 100.0]);
        let out = decide(&ledger, 100.0, 1, 100.0, 150.0, 0.1).unwrap();
        assert_eq!(out.window.index, 1);
        assert_eq!(out.target, None);
    }

    #[test]
    fn fast_flick_snaps_even_inside_expanded_card() {
        let ledger = ledger(&[100.0, 300.0, 100.0]);
        let out = decide(&ledger, 100.0, 1, 100.0, 150.0, 2.0).unwrap();
        assert_eq!(out.window.index, 1);
        assert_eq!(out.target, Some(300.0));
    }

    #[test]
    fn slow_drag_short_of_the_margin_snaps_back() {
        let ledger = ledger(&[100.0, 100.0]);
        let out = decide(&ledger, 100.0, 0, 0.0, 20.0, 0.2).unwrap();
        assert_eq!(out.window.index, 0);
        assert_eq!(out.target, Some(0.0));
    }

    #[test]
    fn slow_drag_past_the_margin_pages_forward() {
        let ledger = ledger(&[100.0, 100.0]);
        let out = decide(&ledger, 100.0, 0, 0.0, 30.0, 0.2).unwrap();
        assert_eq!(out.window.index, 1);
        assert_eq!(out.target, Some(100.0));
    }

    #[test]
    fn upward_release_lands_on_the_previous_cards_bottom() {
        let ledger = ledger(&[300.0, 100.0]);
        // Current card 1 at offset 300; a decisive pull up crosses into the
        // tall card 0, which should show its bottom, not its top.
        let out = decide(&ledger, 100.0, 1, 300.0, 250.0, -1.5).unwrap();
        assert_eq!(out.window.index, 0);
        assert_eq!(out.target, Some(200.0));
    }

    #[test]
    fn snap_target_is_clamped_to_the_scrollable_range() {
        let ledger = ledger(&[100.0, 100.0]);
        let out = decide(&ledger, 100.0, 1, 100.0, 180.0, 3.0).unwrap();
        assert_eq!(out.target, Some(100.0));
    }

    #[test]
    fn offsets_outside_the_content_are_not_paged() {
        let ledger = ledger(&[100.0, 100.0]);
        assert!(decide(&ledger, 100.0, 0, 50.0, -40.0, -2.0).is_none());
        assert!(decide(&ledger, 100.0, 1, 100.0, 250.0, 3.0).is_none());
    }

    #[test]
    fn nothing_to_decide_without_rows_or_viewport() {
        assert!(decide(&HeightLedger::with_rows(0), 100.0, 0, 0.0, 10.0, 0.5).is_none());
        let ledger = ledger(&[100.0]);
        assert!(decide(&ledger, 0.0, 0, 0.0, 10.0, 0.5).is_none());
    }

    #[test]
    fn overscroll_pulls_back_to_card_boundaries() {
        let win = CardWindow {
            index: 1,
            top: 100.0,
            bottom: 400.0,
        };
        assert_eq!(correct_overscroll(&win, 100.0, 320.0), Some(300.0));
        assert_eq!(correct_overscroll(&win, 100.0, 80.0), Some(100.0));
        assert_eq!(correct_overscroll(&win, 100.0, 200.0), None);
    }

    #[test]
    fn overscroll_ignores_collapsed_cards() {
        let win = CardWindow {
            index: 0,
            top: 0.0,
            bottom: 100.0,
        };
        assert_eq!(correct_overscroll(&win, 100.0, 500.0), None);
    }
}
