//! The deck controller: one owned object tying the ledger, the tracker and
//! the paging rules together.
//!
//! The controller never touches the UI.  Every entry point returns the list
//! of [`HostCommand`]s the host must carry out — move the view offset, start
//! an animation stage, persist a dismissal.  The host feeds scroll samples
//! and animation-stage completions back in, closing the loop.

use tracing::debug;

use crate::core::dismiss::{DismissPhase, DismissRun};
use crate::core::ledger::HeightLedger;
use crate::core::pager::{correct_overscroll, decide};
use crate::core::resolver::{resolve, window_of, CardWindow};
use crate::core::tracker::{ScrollSample, ScrollTracker};

// ───────────────────────────────────────── commands ──────────

/// Work the host must perform on the controller's behalf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    /// Drive the view offset toward `target` with animation, feeding every
    /// frame back through [`DeckController::on_scroll`].
    AnimateScrollTo { target: f64 },
    /// Set the view offset to `target` immediately; no samples follow.
    JumpScrollTo { target: f64 },
    /// Flip a row between collapsed and expanded presentation.
    ToggleRow { index: usize },
    /// Start the card's removal animation.
    ShrinkRow { index: usize },
    /// Start folding the shrunk card flat.
    SettleRow { index: usize },
    /// Animate the deck closing over the gap a removed row left behind.
    CollapseGap { index: usize },
    /// Record the dismissal with the store.  Emitted once per row, ever.
    PersistDismiss { index: usize },
    /// Keep horizontal card swipes from starting while a scroll drag runs
    /// (and release them when it ends).
    SetSwipeShield { engaged: bool },
}

/// Action to run once an animated scroll is observed to arrive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollFollowUp {
    /// Pin a card's top exactly, without animation — the card may have
    /// re-measured while the animated pin was in flight.
    RepinCard { index: usize },
}

// ───────────────────────────────────────── controller ────────

/// Scroll/paging state for one deck lifetime.
#[derive(Debug, Default)]
pub struct DeckController {
    ledger: HeightLedger,
    tracker: ScrollTracker<ScrollFollowUp>,
    viewport_h: f64,
    refreshing: bool,
    /// Cached current card; recomputed at the controlled mutation points.
    current: CardWindow,
    dismissal: Option<DismissRun>,
}

impl DeckController {
    pub fn new(rows: usize) -> Self {
        Self {
            ledger: HeightLedger::with_rows(rows),
            ..Self::default()
        }
    }

    // ── read access ──────────────────────────────────────────

    pub fn ledger(&self) -> &HeightLedger {
        &self.ledger
    }

    pub fn current(&self) -> CardWindow {
        self.current
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_h
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn is_dragging(&self) -> bool {
        self.tracker.is_dragging()
    }

    pub fn auto_target(&self) -> Option<f64> {
        self.tracker.auto_target()
    }

    pub fn last_offset(&self) -> f64 {
        self.tracker.last_offset()
    }

    pub fn is_row_removed(&self, index: usize) -> bool {
        self.ledger.is_removed(index)
    }

    pub fn dismissing_row(&self) -> Option<usize> {
        self.dismissal.as_ref().map(|run| run.index)
    }

    // ── layout reports ───────────────────────────────────────

    /// The deck measured its viewport.  All offset math is deferred until
    /// this is non-zero.
    pub fn set_viewport_height(&mut self, height: f64) {
        if self.viewport_h == height {
            return;
        }
        self.viewport_h = height;
        self.refresh_current();
    }

    /// A row reported its rendered height.  A change at or before the
    /// current card shifts the current card's own boundaries, so the cache
    /// is recomputed.
    pub fn report_row_height(&mut self, index: usize, height: f64) {
        if !self.ledger.record_height(index, height) {
            return;
        }
        if index <= self.current.index {
            self.refresh_current();
        }
    }

    fn refresh_current(&mut self) {
        if self.viewport_h <= 0.0 {
            return;
        }
        self.current = resolve(
            &self.ledger,
            self.viewport_h,
            self.tracker.last_offset(),
            true,
            0.0,
        );
    }

    // ── scrolling ────────────────────────────────────────────

    /// A user drag started at `offset`.
    pub fn begin_drag(&mut self, offset: f64) -> Vec<HostCommand> {
        self.tracker.begin_drag(offset);
        vec![HostCommand::SetSwipeShield { engaged: true }]
    }

    /// The drag released at `offset` with `velocity` rows/ms.  Decides
    /// paging; a refresh in progress suppresses it.
    pub fn end_drag(&mut self, offset: f64, velocity: f64) -> Vec<HostCommand> {
        let mut out = vec![HostCommand::SetSwipeShield { engaged: false }];
        let Some(summary) = self.tracker.end_drag(offset) else {
            return out;
        };
        if self.refreshing {
            return out;
        }
        let Some(outcome) = decide(
            &self.ledger,
            self.viewport_h,
            self.current.index,
            summary.start_offset,
            summary.end_offset,
            velocity,
        ) else {
            return out;
        };
        debug!(
            "drag released: dy {:+.1} v {:+.2} -> card {} target {:?}",
            summary.dy(),
            velocity,
            outcome.window.index,
            outcome.target,
        );
        self.current = outcome.window;
        if let Some(target) = outcome.target {
            out.extend(self.scroll_to(target, true, None));
        }
        out
    }

    /// One host scroll sample.  Classifies it and reacts: arrival fires the
    /// follow-up, passive motion runs the overscroll check, drag and
    /// en-route samples are bookkeeping only.
    pub fn on_scroll(&mut self, offset: f64) -> Vec<HostCommand> {
        if self.viewport_h <= 0.0 {
            return Vec::new();
        }
        match self.tracker.observe(offset) {
            ScrollSample::Ignored
            | ScrollSample::AutoEnRoute
            | ScrollSample::Dragging { .. } => Vec::new(),
            ScrollSample::AutoArrived { follow_up } => {
                debug!("auto-scroll arrived at {offset:.1}");
                match follow_up {
                    Some(ScrollFollowUp::RepinCard { index }) => self.repin_card(index),
                    None => Vec::new(),
                }
            }
            ScrollSample::Passive => {
                if self.refreshing || offset > self.ledger.content_len() {
                    return Vec::new();
                }
                match correct_overscroll(&self.current, self.viewport_h, offset) {
                    Some(target) => {
                        debug!("overscroll: {offset:.1} pulled back to {target:.1}");
                        self.scroll_to(target, true, None)
                    }
                    None => Vec::new(),
                }
            }
        }
    }

    /// Programmatic scroll.  Animated scrolls arm the tracker and hand the
    /// movement to the host; non-animated ones apply at once and run their
    /// follow-up synchronously.  With no measured viewport there is nothing
    /// to move, so this no-ops.
    pub fn scroll_to(
        &mut self,
        target: f64,
        animated: bool,
        follow_up: Option<ScrollFollowUp>,
    ) -> Vec<HostCommand> {
        if self.viewport_h <= 0.0 {
            return Vec::new();
        }
        let target = target.max(0.0);
        if animated {
            self.tracker.begin_auto(target, follow_up);
            return vec![HostCommand::AnimateScrollTo { target }];
        }
        self.tracker.jump_to(target);
        self.current = resolve(&self.ledger, self.viewport_h, target, true, 0.0);
        let mut out = vec![HostCommand::JumpScrollTo { target }];
        if let Some(ScrollFollowUp::RepinCard { index }) = follow_up {
            out.extend(self.repin_card(index));
        }
        out
    }

    /// Animated page to a specific row's top, used by keyboard paging.
    pub fn page_to(&mut self, index: usize) -> Vec<HostCommand> {
        let Some(win) = window_of(&self.ledger, index) else {
            return Vec::new();
        };
        self.current = win;
        self.scroll_to(win.top, true, None)
    }

    fn repin_card(&mut self, index: usize) -> Vec<HostCommand> {
        let Some(win) = window_of(&self.ledger, index) else {
            return Vec::new();
        };
        self.scroll_to(win.top, false, None)
    }

    // ── expand / collapse ────────────────────────────────────

    /// Toggle a row's presentation and pin its top through the re-measure:
    /// animated first, then exact once the animation lands.
    pub fn request_toggle_expand(&mut self, index: usize) -> Vec<HostCommand> {
        if self.ledger.is_removed(index) {
            return Vec::new();
        }
        let mut out = vec![HostCommand::ToggleRow { index }];
        if let Some(win) = window_of(&self.ledger, index) {
            out.extend(self.scroll_to(
                win.top,
                true,
                Some(ScrollFollowUp::RepinCard { index }),
            ));
        }
        out
    }

    // ── dismissal ────────────────────────────────────────────

    /// Start dismissing a row.  Idempotent per row, and only one run may be
    /// in flight at a time.
    pub fn request_dismiss(&mut self, index: usize) -> Vec<HostCommand> {
        if index >= self.ledger.len()
            || self.ledger.is_removed(index)
            || self.dismissal.is_some()
        {
            return Vec::new();
        }
        self.dismissal = Some(DismissRun::begin(&self.ledger, index, self.current.top));
        vec![HostCommand::ShrinkRow { index }]
    }

    /// The host finished the current dismissal animation stage.  Advances
    /// the phase chain; the final phases run back-to-back because they need
    /// no host animation of their own.
    pub fn notify_dismiss_stage(&mut self) -> Vec<HostCommand> {
        let Some(mut run) = self.dismissal.take() else {
            return Vec::new();
        };
        match run.advance() {
            DismissPhase::Settling => {
                let index = run.index;
                self.dismissal = Some(run);
                vec![HostCommand::SettleRow { index }]
            }
            DismissPhase::Removed => self.finish_dismiss(run),
            // A stored run is only ever Shrinking or Settling; anything else
            // is already over.
            DismissPhase::Shrinking | DismissPhase::Scrolled => Vec::new(),
        }
    }

    /// Removed + Scrolled phases: mark the ledger, persist, compensate.
    fn finish_dismiss(&mut self, mut run: DismissRun) -> Vec<HostCommand> {
        self.ledger.mark_removed(run.index);
        let mut out = vec![HostCommand::PersistDismiss { index: run.index }];
        run.advance();
        debug!(
            "row {} removed ({} rows left), was_last {}",
            run.index,
            self.ledger.active_rows(),
            run.was_last_active,
        );
        if run.was_last_active {
            // The deck lost its tail: pull back to show the previous card.
            let target = run.card_top - self.viewport_h;
            out.extend(self.scroll_to(target, true, None));
            self.current = resolve(
                &self.ledger,
                self.viewport_h,
                target.max(0.0),
                false,
                0.0,
            );
        } else {
            // The next card slides up into the removed card's place.
            out.extend(self.scroll_to(run.card_top, false, None));
            out.push(HostCommand::CollapseGap { index: run.index });
        }
        out
    }

    // ── refresh ──────────────────────────────────────────────

    /// Refresh began: paging and overscroll correction stand down until
    /// [`DeckController::finish_refresh`].
    pub fn set_refreshing(&mut self) {
        self.refreshing = true;
        self.dismissal = None;
    }

    /// Refresh failed to deliver: stand back up without touching the deck.
    pub fn cancel_refresh(&mut self) {
        self.refreshing = false;
    }

    /// Refresh delivered a new deck of `rows` rows: all measurements and
    /// removals start over and the deck returns to the top.
    pub fn finish_refresh(&mut self, rows: usize) -> Vec<HostCommand> {
        self.refreshing = false;
        self.ledger.reset(rows);
        self.tracker = ScrollTracker::new();
        self.current = CardWindow::default();
        self.scroll_to(0.0, true, None)
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Controller with a measured viewport and reported heights.
    fn deck(viewport_h: f64, heights: &[f64]) -> DeckController {
        let mut ctl = DeckController::new(heights.len());
        ctl.set_viewport_height(viewport_h);
        for (i, &h) in heights.iter().enumerate() {
            ctl.report_row_height(i, h);
        }
        ctl
    }

    fn persist_count(cmds: &[HostCommand]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, HostCommand::PersistDismiss { .. }))
            .count()
    }

    #[test]
    fn nothing_moves_before_the_viewport_is_measured() {
        let mut ctl = DeckController::new(2);
        ctl.report_row_height(0, 100.0);
        assert!(ctl.scroll_to(50.0, true, None).is_empty());
        assert!(ctl.on_scroll(50.0).is_empty());
        assert_eq!(ctl.current(), CardWindow::default());
    }

    #[test]
    fn drag_release_snaps_and_shields_swipes() {
        let mut ctl = deck(100.0, &[100.0, 100.0]);
        assert_eq!(
            ctl.begin_drag(0.0),
            vec![HostCommand::SetSwipeShield { engaged: true }]
        );
        assert!(ctl.on_scroll(20.0).is_empty());
        let cmds = ctl.end_drag(20.0, 0.2);
        assert_eq!(
            cmds,
            vec![
                HostCommand::SetSwipeShield { engaged: false },
                HostCommand::AnimateScrollTo { target: 0.0 },
            ]
        );
        // The snap's own samples are suppressed, then arrival clears it.
        assert!(ctl.on_scroll(10.0).is_empty());
        assert!(ctl.on_scroll(0.0).is_empty());
        assert_eq!(ctl.auto_target(), None);
    }

    #[test]
    fn refresh_suppresses_paging_until_finished() {
        let mut ctl = deck(100.0, &[100.0, 100.0]);
        ctl.set_refreshing();
        ctl.begin_drag(0.0);
        ctl.on_scroll(60.0);
        let cmds = ctl.end_drag(60.0, 0.4);
        assert_eq!(cmds, vec![HostCommand::SetSwipeShield { engaged: false }]);

        let cmds = ctl.finish_refresh(3);
        assert_eq!(cmds, vec![HostCommand::AnimateScrollTo { target: 0.0 }]);
        assert!(!ctl.is_refreshing());
        assert_eq!(ctl.ledger().len(), 3);
        assert_eq!(ctl.ledger().content_len(), 0.0);
    }

    #[test]
    fn cancelled_refresh_keeps_the_deck_intact() {
        let mut ctl = deck(100.0, &[100.0, 100.0]);
        ctl.scroll_to(100.0, false, None);
        ctl.set_refreshing();
        ctl.cancel_refresh();
        assert!(!ctl.is_refreshing());
        assert_eq!(ctl.ledger().len(), 2);
        assert_eq!(ctl.current().index, 1);
    }

    #[test]
    fn passive_overscroll_is_pulled_back_inside_the_expanded_card() {
        let mut ctl = deck(100.0, &[100.0, 300.0, 100.0]);
        ctl.scroll_to(100.0, false, None);
        assert_eq!(ctl.current().index, 1);
        let cmds = ctl.on_scroll(320.0);
        assert_eq!(cmds, vec![HostCommand::AnimateScrollTo { target: 300.0 }]);
        // En-route samples stay quiet; arrival ends the correction.
        assert!(ctl.on_scroll(310.0).is_empty());
        assert!(ctl.on_scroll(300.0).is_empty());
        assert!(ctl.on_scroll(250.0).is_empty());
    }

    #[test]
    fn height_re_report_at_or_before_current_shifts_its_boundaries() {
        let mut ctl = deck(100.0, &[100.0, 300.0, 100.0]);
        ctl.scroll_to(100.0, false, None);
        assert_eq!(ctl.current().top, 100.0);
        ctl.report_row_height(0, 50.0);
        assert_eq!(ctl.current().index, 1);
        assert_eq!(ctl.current().top, 50.0);
        assert_eq!(ctl.current().bottom, 350.0);
    }

    #[test]
    fn toggle_pins_the_card_top_animated_then_exact() {
        let mut ctl = deck(100.0, &[100.0, 100.0, 100.0]);
        ctl.scroll_to(100.0, false, None);
        let cmds = ctl.request_toggle_expand(1);
        assert_eq!(
            cmds,
            vec![
                HostCommand::ToggleRow { index: 1 },
                HostCommand::AnimateScrollTo { target: 100.0 },
            ]
        );
        // The row re-measures expanded while the pin animates.
        ctl.report_row_height(1, 300.0);
        let cmds = ctl.on_scroll(100.0);
        assert_eq!(cmds, vec![HostCommand::JumpScrollTo { target: 100.0 }]);
        assert_eq!(ctl.current().bottom, 400.0);
    }

    #[test]
    fn dismissal_runs_its_phases_and_persists_once() {
        let mut ctl = deck(100.0, &[100.0, 300.0, 100.0]);
        ctl.scroll_to(100.0, false, None);
        assert_eq!(
            ctl.request_dismiss(1),
            vec![HostCommand::ShrinkRow { index: 1 }]
        );
        // Re-requests while the run is alive change nothing.
        assert!(ctl.request_dismiss(1).is_empty());
        assert_eq!(
            ctl.notify_dismiss_stage(),
            vec![HostCommand::SettleRow { index: 1 }]
        );
        let cmds = ctl.notify_dismiss_stage();
        assert_eq!(persist_count(&cmds), 1);
        assert!(cmds.contains(&HostCommand::JumpScrollTo { target: 100.0 }));
        assert!(cmds.contains(&HostCommand::CollapseGap { index: 1 }));

        // The removed row vanished from geometry: rows are now
        // [100, gone, 100] and offset 150 belongs to row 2.
        let win = resolve(ctl.ledger(), 100.0, 150.0, true, 0.0);
        assert_eq!(win.index, 2);
        assert_eq!(win.top, 100.0);
        assert_eq!(win.bottom, 200.0);

        // A second dismiss of the same row is a no-op: no commands, no
        // second persist.
        assert!(ctl.request_dismiss(1).is_empty());
        assert!(ctl.notify_dismiss_stage().is_empty());
    }

    #[test]
    fn last_row_dismissal_scrolls_back_not_forward() {
        let mut ctl = deck(100.0, &[100.0, 100.0, 100.0]);
        ctl.scroll_to(200.0, false, None);
        assert_eq!(ctl.current().index, 2);
        ctl.request_dismiss(2);
        ctl.notify_dismiss_stage();
        let cmds = ctl.notify_dismiss_stage();
        assert!(cmds.contains(&HostCommand::AnimateScrollTo { target: 100.0 }));
        assert!(!cmds.iter().any(|c| matches!(c, HostCommand::CollapseGap { .. })));
        assert_eq!(ctl.current().index, 1);
    }

    #[test]
    fn dismissing_the_only_row_clamps_the_scroll_at_zero() {
        let mut ctl = deck(100.0, &[100.0]);
        ctl.request_dismiss(0);
        ctl.notify_dismiss_stage();
        let cmds = ctl.notify_dismiss_stage();
        assert!(cmds.contains(&HostCommand::AnimateScrollTo { target: 0.0 }));
    }

    #[test]
    fn drag_cancels_auto_scroll_follow_up_for_good() {
        let mut ctl = deck(100.0, &[100.0, 100.0]);
        ctl.scroll_to(
            100.0,
            true,
            Some(ScrollFollowUp::RepinCard { index: 1 }),
        );
        ctl.begin_drag(40.0);
        // Sailing through the abandoned target fires nothing.
        assert!(ctl.on_scroll(100.0).is_empty());
        let cmds = ctl.end_drag(100.0, 2.0);
        assert_eq!(
            cmds,
            vec![
                HostCommand::SetSwipeShield { engaged: false },
                HostCommand::AnimateScrollTo { target: 100.0 },
            ]
        );
    }
}
