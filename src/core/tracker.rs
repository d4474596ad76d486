//! Scroll position bookkeeping: drags, passive motion and auto-scrolls.
//!
//! Every host scroll sample funnels through [`ScrollTracker::observe`], which
//! classifies it.  While an auto-scroll is en route its samples are
//! suppressed so paging and overscroll correction cannot fight the
//! animation; the sample landing within [`ARRIVAL_EPSILON`] of the target
//! ends the auto-scroll and surrenders its follow-up exactly once.  During a
//! drag the anchor offset is frozen, so each sample reports total travel
//! since the drag began.

/// How close (in rows) a sample must come to the auto-scroll target to count
/// as arrival.
pub const ARRIVAL_EPSILON: f64 = 0.001;

// ───────────────────────────────────────── samples ───────────

/// Classification of one observed scroll offset.
#[derive(Debug, PartialEq)]
pub enum ScrollSample<F> {
    /// Negative offset; dropped before any bookkeeping.
    Ignored,
    /// An auto-scroll is still travelling; nothing else may react.
    AutoEnRoute,
    /// The auto-scroll just landed.  Its follow-up is handed over here and
    /// never again.
    AutoArrived { follow_up: Option<F> },
    /// Sample taken mid-drag; `dy` is travel since the drag anchor.
    Dragging { dy: f64 },
    /// Ordinary motion; the last-offset anchor was updated and the caller
    /// should run its overscroll check.
    Passive,
}

/// A finished drag, ready for the paging decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSummary {
    pub start_offset: f64,
    pub end_offset: f64,
}

impl DragSummary {
    pub fn dy(&self) -> f64 {
        self.end_offset - self.start_offset
    }
}

// ───────────────────────────────────────── tracker ───────────

#[derive(Debug)]
struct AutoScroll<F> {
    target: f64,
    follow_up: Option<F>,
}

/// Scroll state shared by paging, overscroll correction and auto-scrolls.
/// `F` is the host's follow-up payload, carried opaquely.
#[derive(Debug)]
pub struct ScrollTracker<F> {
    last_offset: f64,
    /// Anchor offset of the drag in progress, `None` when not dragging.
    drag_anchor: Option<f64>,
    auto: Option<AutoScroll<F>>,
}

impl<F> Default for ScrollTracker<F> {
    fn default() -> Self {
        Self {
            last_offset: 0.0,
            drag_anchor: None,
            auto: None,
        }
    }
}

impl<F> ScrollTracker<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the most recent settled sample (frozen while dragging).
    pub fn last_offset(&self) -> f64 {
        self.last_offset
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn auto_target(&self) -> Option<f64> {
        self.auto.as_ref().map(|a| a.target)
    }

    /// Start tracking a user drag anchored at `offset`.  Any auto-scroll in
    /// flight is cancelled and its follow-up dropped — the user took over.
    pub fn begin_drag(&mut self, offset: f64) {
        self.auto = None;
        self.drag_anchor = Some(offset);
    }

    /// Finish the drag at `offset` and report where it travelled.  `None`
    /// when no drag was in progress.
    pub fn end_drag(&mut self, offset: f64) -> Option<DragSummary> {
        let anchor = self.drag_anchor.take()?;
        Some(DragSummary {
            start_offset: anchor,
            end_offset: offset,
        })
    }

    /// Arm an auto-scroll toward `target`.  A previous auto-scroll, arrived
    /// or not, is superseded and its follow-up silently dropped.
    pub fn begin_auto(&mut self, target: f64, follow_up: Option<F>) {
        self.auto = Some(AutoScroll { target, follow_up });
    }

    /// Drop any in-flight auto-scroll without firing its follow-up.
    pub fn cancel_auto(&mut self) {
        self.auto = None;
    }

    /// Authoritative reposition without animation: no arrival tracking, and
    /// a pending auto-scroll is superseded.
    pub fn jump_to(&mut self, offset: f64) {
        self.auto = None;
        self.last_offset = offset;
    }

    /// Classify one host scroll sample.
    pub fn observe(&mut self, offset: f64) -> ScrollSample<F> {
        if offset < 0.0 {
            return ScrollSample::Ignored;
        }
        if let Some(auto) = &self.auto {
            if (offset - auto.target).abs() > ARRIVAL_EPSILON {
                return ScrollSample::AutoEnRoute;
            }
            let follow_up = self.auto.take().and_then(|a| a.follow_up);
            self.last_offset = offset;
            return ScrollSample::AutoArrived { follow_up };
        }
        if let Some(anchor) = self.drag_anchor {
            return ScrollSample::Dragging {
                dy: offset - anchor,
            };
        }
        self.last_offset = offset;
        ScrollSample::Passive
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_fires_exactly_once_on_arrival() {
        let mut tracker: ScrollTracker<&str> = ScrollTracker::new();
        tracker.begin_auto(300.0, Some("done"));
        assert_eq!(tracker.observe(150.0), ScrollSample::AutoEnRoute);
        assert_eq!(
            tracker.observe(299.9995),
            ScrollSample::AutoArrived {
                follow_up: Some("done")
            }
        );
        // The next sample is ordinary motion; nothing fires twice.
        assert_eq!(tracker.observe(300.0001), ScrollSample::Passive);
        assert_eq!(tracker.last_offset(), 300.0001);
    }

    #[test]
    fn newer_auto_supersedes_and_drops_the_old_follow_up() {
        let mut tracker: ScrollTracker<&str> = ScrollTracker::new();
        tracker.begin_auto(100.0, Some("first"));
        tracker.begin_auto(200.0, Some("second"));
        assert_eq!(tracker.observe(100.0), ScrollSample::AutoEnRoute);
        assert_eq!(
            tracker.observe(200.0),
            ScrollSample::AutoArrived {
                follow_up: Some("second")
            }
        );
    }

    #[test]
    fn drag_travel_is_measured_from_a_frozen_anchor() {
        let mut tracker: ScrollTracker<()> = ScrollTracker::new();
        tracker.observe(100.0);
        tracker.begin_drag(100.0);
        assert_eq!(tracker.observe(130.0), ScrollSample::Dragging { dy: 30.0 });
        assert_eq!(tracker.observe(160.0), ScrollSample::Dragging { dy: 60.0 });
        // The anchor never moved while dragging.
        assert_eq!(tracker.last_offset(), 100.0);
        let summary = tracker.end_drag(160.0).unwrap();
        assert_eq!(summary.start_offset, 100.0);
        assert_eq!(summary.end_offset, 160.0);
        assert_eq!(summary.dy(), 60.0);
    }

    #[test]
    fn beginning_a_drag_cancels_the_auto_scroll() {
        let mut tracker: ScrollTracker<&str> = ScrollTracker::new();
        tracker.observe(50.0);
        tracker.begin_auto(300.0, Some("never"));
        tracker.begin_drag(50.0);
        assert_eq!(tracker.auto_target(), None);
        // Landing on the old target is just drag travel now.
        assert_eq!(tracker.observe(300.0), ScrollSample::Dragging { dy: 250.0 });
    }

    #[test]
    fn negative_offsets_are_dropped_before_any_bookkeeping() {
        let mut tracker: ScrollTracker<()> = ScrollTracker::new();
        tracker.observe(40.0);
        tracker.begin_auto(-0.0, None);
        tracker.cancel_auto();
        assert_eq!(tracker.observe(-1.0), ScrollSample::Ignored);
        assert_eq!(tracker.last_offset(), 40.0);
        tracker.begin_drag(40.0);
        assert_eq!(tracker.observe(-5.0), ScrollSample::Ignored);
    }

    #[test]
    fn end_drag_without_begin_is_a_no_op() {
        let mut tracker: ScrollTracker<()> = ScrollTracker::new();
        assert_eq!(tracker.end_drag(0.0), None);
    }

    #[test]
    fn jump_repositions_without_arrival() {
        let mut tracker: ScrollTracker<&str> = ScrollTracker::new();
        tracker.begin_auto(500.0, Some("dropped"));
        tracker.jump_to(500.0);
        assert_eq!(tracker.auto_target(), None);
        assert_eq!(tracker.last_offset(), 500.0);
        assert_eq!(tracker.observe(500.0), ScrollSample::Passive);
    }
}
