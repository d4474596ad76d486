//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use ratatui::layout::Rect;
use tracing::warn;

use super::store_runtime::ProfileWrite;
use crate::config::AppConfig;
use crate::core::controller::DeckController;
use crate::core::store::{RecStore, SavedSection, SavedSort};
use crate::ui::animate::Tween;
use crate::ui::deck_widget::DeckRow;

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Deck,
    SettingsMenu,
    ControlsSubmenu,
    SavedList,
}

// ───────────────────────────────────────── gestures ──────────

/// Sliding window of recent drag positions, for release velocity.
///
/// Velocity is measured over roughly the last [`TRACE_WINDOW_MS`] of motion,
/// so a drag that pauses before release reads as stationary rather than as
/// its earlier peak speed.
#[derive(Debug, Default)]
pub struct GestureTrace {
    samples: VecDeque<(Instant, f64)>,
}

/// How far back the velocity window reaches.
const TRACE_WINDOW_MS: u64 = 80;

impl GestureTrace {
    pub fn push(&mut self, at: Instant, pos: f64) {
        self.samples.push_back((at, pos));
        while let Some(&(t, _)) = self.samples.front() {
            let stale = at.duration_since(t) > Duration::from_millis(TRACE_WINDOW_MS);
            if stale && self.samples.len() > 2 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Signed velocity in positions per millisecond across the window.
    pub fn velocity(&self) -> f64 {
        let (first, last) = match (self.samples.front(), self.samples.back()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };
        let dt_ms = last.0.duration_since(first.0).as_secs_f64() * 1000.0;
        if dt_ms <= 0.0 {
            return 0.0;
        }
        (last.1 - first.1) / dt_ms
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// State of the current mouse gesture over the deck.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MouseGesture {
    #[default]
    Idle,
    /// Button is down but the drag direction is not yet known.
    Pending { col: u16, row: u16 },
    /// Vertical drag: the deck scrolls with the pointer.
    VerticalDrag { start_row: u16, start_offset: f64 },
    /// Horizontal drag: the card under the pointer swipes sideways.
    HorizontalSwipe { start_col: u16, row: usize },
}

/// What a released (or held) swipe is currently doing.
#[derive(Debug, Clone, PartialEq)]
pub enum SwipeAnim {
    /// Pointer is down; `dx` follows it directly.
    Held,
    /// Released past the trigger: sliding off at `velocity` columns/ms.
    SlideOut { velocity: f64 },
    /// Released short of the trigger: easing back to rest.
    SnapBack { tween: Tween, from_dx: f64 },
}

/// Horizontal displacement of one card, in columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeProgress {
    pub row: usize,
    pub dx: f64,
    pub anim: SwipeAnim,
}

/// Collapse animation for the gap a removed card leaves behind.  Rows below
/// `row` are drawn shifted up by `height * eased` until the tween lands and
/// the geometry takes over.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleAnim {
    pub row: usize,
    pub height: f64,
    pub tween: Tween,
}

/// State of the saved popup while it is open.
#[derive(Debug)]
pub struct SavedViewState {
    pub sort: SavedSort,
    pub sections: Vec<SavedSection>,
    /// Selected entry, counted across sections.
    pub selected: usize,
    /// First visible list row.
    pub scroll: usize,
}

// ───────────────────────────────────────── app state ─────────

/// Top-level application state.
pub struct AppState {
    /// Deck rows in display order (parallel to the controller's ledger).
    pub rows: Vec<DeckRow>,
    /// Scroll controller: paging, dismissal and arrival bookkeeping.
    pub controller: DeckController,
    /// Offset actually drawn this frame, in fractional rows.
    pub view_offset: f64,
    /// In-flight animated scroll, if any.
    pub glide: Option<crate::ui::animate::ScrollGlide>,
    /// In-flight card swipe, if any.
    pub swipe: Option<SwipeProgress>,
    /// Collapse animation for a just-dismissed card, if any.
    pub settle: Option<SettleAnim>,
    /// Current mouse gesture over the deck.
    pub gesture: MouseGesture,
    /// Recent vertical drag positions, for release velocity.
    pub drag_trace: GestureTrace,
    /// Recent horizontal swipe positions, for release velocity.
    pub swipe_trace: GestureTrace,
    /// Time of the most recent wheel notch; the streak ends after a lull.
    pub wheel_last: Option<Instant>,
    /// While `true`, new horizontal swipes are refused (deck is between pages).
    pub swipe_shield: bool,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Which view / overlay is currently shown.
    pub active_view: ActiveView,
    /// User-configurable keybindings and deck settings.
    pub config: AppConfig,
    /// Currently highlighted item in the settings menu.
    pub settings_selected: usize,
    /// Currently highlighted item in the controls submenu.
    pub controls_selected: usize,
    /// When `true`, the controls submenu is waiting for the user to press
    /// a key to rebind the action at `controls_selected`.
    pub awaiting_rebind: bool,
    /// Catalog plus this user's saved and dismissed ids.
    pub store: RecStore,
    /// Background profile writer; `None` once teardown has begun.
    pub profile_tx: Option<Sender<ProfileWrite>>,
    /// Set by the handler to make the main loop start a catalog reload.
    pub refresh_requested: bool,
    /// Monotonic generation id used to ignore stale catalog reloads.
    pub refresh_generation: u64,
    /// Advances while refreshing; drives the spinner frames.
    pub spinner_tick: u64,
    /// Saved popup state while it is open.
    pub saved: Option<SavedViewState>,
    /// Fixed clock from `--now`; `None` uses the wall clock.
    pub fake_now: Option<NaiveDateTime>,
    /// Most recent terminal size, for mouse hit-testing.
    pub terminal_area: Rect,
    /// Previous animation tick, for frame deltas.
    pub last_tick: Instant,
}

impl AppState {
    pub fn new(rows: Vec<DeckRow>, store: RecStore, config: AppConfig) -> Self {
        let controller = DeckController::new(rows.len());
        Self {
            rows,
            controller,
            view_offset: 0.0,
            glide: None,
            swipe: None,
            settle: None,
            gesture: MouseGesture::default(),
            drag_trace: GestureTrace::default(),
            swipe_trace: GestureTrace::default(),
            wheel_last: None,
            swipe_shield: false,
            should_quit: false,
            status_message: None,
            active_view: ActiveView::default(),
            config,
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
            store,
            profile_tx: None,
            refresh_requested: false,
            refresh_generation: 0,
            spinner_tick: 0,
            saved: None,
            fake_now: None,
            terminal_area: Rect::default(),
            last_tick: Instant::now(),
        }
    }

    /// The clock the deck runs on.
    pub fn now(&self) -> NaiveDateTime {
        self.fake_now
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    /// Largest legal scroll offset for the current content and viewport.
    pub fn max_offset(&self) -> f64 {
        let ledger = self.controller.ledger();
        (ledger.content_len() - self.controller.viewport_height()).max(0.0)
    }

    /// 1-based position of the current card among the live rows, with the
    /// live total.  `(0, 0)` when the deck is empty.
    pub fn deck_position(&self) -> (usize, usize) {
        let current = self.controller.current().index;
        let mut position = 0;
        let mut total = 0;
        for (index, _) in self.controller.ledger().active_heights() {
            total += 1;
            if index <= current {
                position = total;
            }
        }
        (position, total)
    }

    /// Hand the current profile to the background writer; falls back to a
    /// synchronous write when the writer is gone.
    pub fn queue_profile_write(&mut self) {
        let write = ProfileWrite {
            path: self.store.profile_path().to_path_buf(),
            contents: self.store.serialise_profile(),
        };
        let sent = match &self.profile_tx {
            Some(tx) => tx.send(write).is_ok(),
            None => false,
        };
        if !sent {
            if let Err(err) = self.store.save_profile() {
                warn!("profile write failed: {err:#}");
            }
        }
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_velocity_spans_first_to_last_sample() {
        let t0 = Instant::now();
        let mut trace = GestureTrace::default();
        trace.push(t0, 0.0);
        trace.push(t0 + Duration::from_millis(20), 4.0);
        trace.push(t0 + Duration::from_millis(40), 8.0);
        // 8 positions over 40ms.
        assert!((trace.velocity() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn trace_forgets_motion_older_than_its_window() {
        let t0 = Instant::now();
        let mut trace = GestureTrace::default();
        // Fast early motion...
        trace.push(t0, 0.0);
        trace.push(t0 + Duration::from_millis(10), 30.0);
        // ...then a long stationary hold before release.
        for ms in [100u64, 150, 200, 250] {
            trace.push(t0 + Duration::from_millis(ms), 30.0);
        }
        assert!(trace.velocity().abs() < 1e-9);
    }

    #[test]
    fn trace_with_one_sample_reads_zero() {
        let mut trace = GestureTrace::default();
        trace.push(Instant::now(), 12.0);
        assert_eq!(trace.velocity(), 0.0);
    }
}
