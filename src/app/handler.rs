//! Input handling — maps key/mouse/tick events to state mutations.
//!
//! The deck itself never moves here; every scroll decision goes through the
//! controller, and this module carries out whatever commands it returns.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use super::settings::{SettingsItem, SETTINGS_ITEMS};
use super::state::{
    ActiveView, AppState, MouseGesture, SavedViewState, SettleAnim, SwipeAnim, SwipeProgress,
};
use crate::config::{Action, KeyBind};
use crate::core::controller::HostCommand;
use crate::ui::animate::{ScrollGlide, Tween, SETTLE_MS, SLIDE_OUT_MIN_SPEED, SNAP_BACK_MS};
use crate::ui::layout::AppLayout;
use crate::ui::saved;

/// Multiplier mapping cell-based gesture velocity onto the paging scale.
/// Terminal cells are coarse: a brisk flick covers a handful of rows in tens
/// of milliseconds, roughly an eighth of the equivalent touch speeds.
const GESTURE_VELOCITY_GAIN: f64 = 8.0;

/// Scaled release speed at or above which a swipe dismisses its card.
const SWIPE_TRIGGER_SPEED: f64 = 1.0;

/// A wheel streak ends after this much quiet.
const WHEEL_SETTLE_MS: u64 = 150;

/// Total selectable rows in the controls submenu (actions + "Reset").
pub fn controls_item_count() -> usize {
    Action::ALL.len() + 1
}

/// Process a key event, dispatching based on the active view.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.active_view {
        ActiveView::Deck => handle_deck_key(state, key),
        ActiveView::SettingsMenu => handle_settings_key(state, key),
        ActiveView::ControlsSubmenu => {
            if state.awaiting_rebind {
                handle_rebind_key(state, key);
            } else {
                handle_controls_key(state, key);
            }
        }
        ActiveView::SavedList => handle_saved_key(state, key),
    }
}

// ── Deck view (configurable bindings) ───────────────────────────

fn handle_deck_key(state: &mut AppState, key: KeyEvent) {
    let Some(action) = state.config.match_key(key) else {
        return;
    };
    match action {
        Action::NextCard => page_step(state, true),
        Action::PrevCard => page_step(state, false),
        Action::ToggleExpand => {
            if let Some(index) = current_live_index(state) {
                let cmds = state.controller.request_toggle_expand(index);
                apply_commands(state, cmds);
            }
        }
        Action::ToggleSave => toggle_save_current(state),
        Action::Dismiss => dismiss_current(state),
        Action::Refresh => request_refresh(state),
        Action::OpenSaved => open_saved(state),
        Action::OpenSettings => {
            state.active_view = ActiveView::SettingsMenu;
            state.settings_selected = 0;
        }
        Action::Quit => state.should_quit = true,
    }
}

/// Index of the card under the page cursor, unless the deck is empty.
fn current_live_index(state: &AppState) -> Option<usize> {
    let index = state.controller.current().index;
    if state.rows.is_empty() || state.controller.is_row_removed(index) {
        return None;
    }
    Some(index)
}

/// Animated page to the nearest live neighbor in the given direction.
fn page_step(state: &mut AppState, forward: bool) {
    let target = {
        let current = state.controller.current().index;
        let ledger = state.controller.ledger();
        if forward {
            ledger.active_heights().map(|(i, _)| i).find(|&i| i > current)
        } else {
            ledger
                .active_heights()
                .map(|(i, _)| i)
                .take_while(|&i| i < current)
                .last()
        }
    };
    let Some(index) = target else {
        return;
    };
    let cmds = state.controller.page_to(index);
    apply_commands(state, cmds);
}

fn toggle_save_current(state: &mut AppState) {
    let Some(index) = current_live_index(state) else {
        return;
    };
    let id = state.rows[index].rec.id.clone();
    let saved_now = state.store.toggle_saved(&id);
    state.rows[index].saved = saved_now;
    state.queue_profile_write();
    let event = &state.rows[index].rec.event;
    state.status_message = Some(if saved_now {
        format!("Saved ♥ {event}")
    } else {
        format!("Removed ♥ {event}")
    });
}

fn dismiss_current(state: &mut AppState) {
    let Some(index) = current_live_index(state) else {
        return;
    };
    if state.controller.dismissing_row().is_some() || state.controller.is_refreshing() {
        return;
    }
    // No pointer behind this one, so the card leaves at the floor speed.
    let cmds = state.controller.request_dismiss(index);
    apply_commands(state, cmds);
}

fn request_refresh(state: &mut AppState) {
    if state.controller.is_refreshing() || state.controller.dismissing_row().is_some() {
        return;
    }
    state.refresh_generation += 1;
    state.refresh_requested = true;
    state.controller.set_refreshing();
    state.spinner_tick = 0;
    // A mid-flight gesture would race the catalog swap.
    state.glide = None;
    state.swipe = None;
    state.settle = None;
    state.gesture = MouseGesture::Idle;
    state.wheel_last = None;
    state.status_message = Some("Looking for more…".into());
}

fn open_saved(state: &mut AppState) {
    let sort = state.config.saved_sort;
    let sections = state.store.saved_sections(sort, state.now());
    state.saved = Some(SavedViewState {
        sort,
        sections,
        selected: 0,
        scroll: 0,
    });
    state.active_view = ActiveView::SavedList;
}

// ── Saved popup ─────────────────────────────────────────────────

fn handle_saved_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => {
            state.saved = None;
            state.active_view = ActiveView::Deck;
        }
        KeyCode::Char('s') | KeyCode::Tab => {
            if let Some(view) = state.saved.as_mut() {
                view.sort = view.sort.next();
                view.selected = 0;
                view.scroll = 0;
            }
            rebuild_saved(state);
        }
        KeyCode::Up | KeyCode::Char('k') => move_saved_selection(state, -1),
        KeyCode::Down | KeyCode::Char('j') => move_saved_selection(state, 1),
        KeyCode::Delete | KeyCode::Backspace => unsave_selected(state),
        _ => {}
    }
}

/// Re-derive the section list from the store, keeping the selection in range.
fn rebuild_saved(state: &mut AppState) {
    let Some(sort) = state.saved.as_ref().map(|v| v.sort) else {
        return;
    };
    let sections = state.store.saved_sections(sort, state.now());
    if let Some(view) = state.saved.as_mut() {
        let rows = saved::build_rows(&sections);
        let entries = saved::entry_count(&rows);
        view.selected = view.selected.min(entries.saturating_sub(1));
        view.sections = sections;
    }
    scroll_saved_into_view(state);
}

fn move_saved_selection(state: &mut AppState, delta: i64) {
    if let Some(view) = state.saved.as_mut() {
        let rows = saved::build_rows(&view.sections);
        let entries = saved::entry_count(&rows) as i64;
        if entries == 0 {
            return;
        }
        let next = (view.selected as i64 + delta).clamp(0, entries - 1);
        view.selected = next as usize;
    }
    scroll_saved_into_view(state);
}

fn unsave_selected(state: &mut AppState) {
    let id = {
        let Some(view) = state.saved.as_ref() else {
            return;
        };
        let mut found = None;
        let mut n = 0;
        'sections: for section in &view.sections {
            for rec in &section.recs {
                if n == view.selected {
                    found = Some(rec.id.clone());
                    break 'sections;
                }
                n += 1;
            }
        }
        match found {
            Some(id) => id,
            None => return,
        }
    };
    state.store.toggle_saved(&id);
    // Deck hearts mirror the saved set.
    if let Some(row) = state.rows.iter_mut().find(|r| r.rec.id == id) {
        row.saved = false;
    }
    state.queue_profile_write();
    rebuild_saved(state);
}

/// Keep the selected entry inside the popup's visible window.
fn scroll_saved_into_view(state: &mut AppState) {
    let popup = saved::popup_area(state.terminal_area);
    let visible = saved::list_viewport_rows(popup);
    if let Some(view) = state.saved.as_mut() {
        let rows = saved::build_rows(&view.sections);
        let Some(row) = saved::row_of_entry(&rows, view.selected) else {
            view.scroll = 0;
            return;
        };
        if row < view.scroll {
            view.scroll = row;
        } else if visible > 0 && row >= view.scroll + visible {
            view.scroll = row + 1 - visible;
        }
    }
}

// ── Settings menu (hardcoded navigation) ────────────────────────

fn handle_settings_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            state.active_view = ActiveView::Deck;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.settings_selected = state.settings_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.settings_selected < SETTINGS_ITEMS.len() - 1 {
                state.settings_selected += 1;
            }
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
            if let Some(item) = SETTINGS_ITEMS.get(state.settings_selected) {
                match item {
                    SettingsItem::Submenu { view, .. } => {
                        state.active_view = *view;
                        state.controls_selected = 0;
                    }
                    SettingsItem::Toggle { get, set, .. } => {
                        let current = get(state);
                        set(state, !current);
                    }
                    SettingsItem::Cycle { cycle, .. } => {
                        cycle(state);
                    }
                }
            }
        }
        _ => {}
    }
}

// ── Controls submenu (hardcoded navigation, interactive rebinding) ──

fn handle_controls_key(state: &mut AppState, key: KeyEvent) {
    let item_count = controls_item_count();

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            state.active_view = ActiveView::Deck;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.active_view = ActiveView::SettingsMenu;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.controls_selected = state.controls_selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.controls_selected < item_count - 1 {
                state.controls_selected += 1;
            }
        }
        KeyCode::Enter => {
            if state.controls_selected < Action::ALL.len() {
                // Start rebinding the selected action.
                state.awaiting_rebind = true;
            } else {
                // "Reset to defaults" item.
                state.config.reset_defaults();
                let _ = state.config.save();
            }
        }
        KeyCode::Delete | KeyCode::Backspace => {
            // Clear all bindings for the selected action.
            if state.controls_selected < Action::ALL.len() {
                let action = Action::ALL[state.controls_selected];
                state.config.bindings.insert(action, Vec::new());
                let _ = state.config.save();
            }
        }
        _ => {}
    }
}

/// Capture the next key press as a new binding.
fn handle_rebind_key(state: &mut AppState, key: KeyEvent) {
    // Only process Press events (ignore Release/Repeat on supported terminals).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Esc cancels rebinding.
    if key.code == KeyCode::Esc {
        state.awaiting_rebind = false;
        return;
    }

    // Don't allow rebinding Ctrl+C (reserved for emergency quit).
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return;
    }

    let action = Action::ALL[state.controls_selected];
    let bind = KeyBind::from_key_event(key);
    state.config.add_binding(action, bind);
    let _ = state.config.save();
    state.awaiting_rebind = false;
}

// ── Mouse ───────────────────────────────────────────────────────

/// Process a mouse event.  Only the deck view takes the mouse; popups are
/// keyboard-driven.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.active_view != ActiveView::Deck {
        return;
    }

    let layout = AppLayout::from_area(state.terminal_area);
    let deck = layout.deck_area;
    // Card text sits inside the deck's border.
    let inner = Rect::new(
        deck.x + 1,
        deck.y + 1,
        deck.width.saturating_sub(2),
        deck.height.saturating_sub(2),
    );

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if !point_in_rect(deck, mouse.column, mouse.row) {
                return;
            }
            state.gesture = MouseGesture::Pending {
                col: mouse.column,
                row: mouse.row,
            };
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            handle_drag(state, inner, mouse.column, mouse.row)
        }
        MouseEventKind::Up(MouseButton::Left) => handle_release(state),
        MouseEventKind::ScrollDown => wheel_notch(state, 1),
        MouseEventKind::ScrollUp => wheel_notch(state, -1),
        _ => {}
    }
}

/// First movement decides the gesture axis; later movement feeds it.
fn handle_drag(state: &mut AppState, inner: Rect, col: u16, row: u16) {
    match state.gesture {
        MouseGesture::Pending { col: c0, row: r0 } => {
            let dcol = col as i32 - c0 as i32;
            let drow = row as i32 - r0 as i32;
            if drow.abs() > dcol.abs() && drow.abs() >= 1 {
                begin_vertical_drag(state, r0);
                drag_vertical(state, row);
            } else if dcol.abs() > drow.abs() && dcol.abs() >= 2 {
                try_begin_swipe(state, inner, c0, r0);
                if matches!(state.gesture, MouseGesture::HorizontalSwipe { .. }) {
                    drag_horizontal(state, col);
                }
            }
        }
        MouseGesture::VerticalDrag { .. } => drag_vertical(state, row),
        MouseGesture::HorizontalSwipe { .. } => drag_horizontal(state, col),
        MouseGesture::Idle => {}
    }
}

fn begin_vertical_drag(state: &mut AppState, start_row: u16) {
    if state.controller.dismissing_row().is_some() {
        state.gesture = MouseGesture::Idle;
        return;
    }
    state.glide = None;
    state.drag_trace.clear();
    state.drag_trace.push(Instant::now(), state.view_offset);
    let cmds = state.controller.begin_drag(state.view_offset);
    state.gesture = MouseGesture::VerticalDrag {
        start_row,
        start_offset: state.view_offset,
    };
    apply_commands(state, cmds);
}

fn drag_vertical(state: &mut AppState, row: u16) {
    let MouseGesture::VerticalDrag {
        start_row,
        start_offset,
    } = state.gesture
    else {
        return;
    };
    // Touch semantics: content follows the pointer, so offset moves opposite.
    let drow = row as f64 - start_row as f64;
    let offset = (start_offset - drow).clamp(0.0, state.max_offset());
    state.view_offset = offset;
    state.drag_trace.push(Instant::now(), offset);
    let cmds = state.controller.on_scroll(offset);
    apply_commands(state, cmds);
}

/// A sideways pull only swipes the page's current card, and only while the
/// deck is at rest.
fn try_begin_swipe(state: &mut AppState, inner: Rect, col: u16, row: u16) {
    if state.swipe_shield
        || state.controller.dismissing_row().is_some()
        || state.controller.is_refreshing()
    {
        state.gesture = MouseGesture::Idle;
        return;
    }
    let Some(row_index) = card_at_point(state, inner, row) else {
        state.gesture = MouseGesture::Idle;
        return;
    };
    if row_index != state.controller.current().index {
        state.gesture = MouseGesture::Idle;
        return;
    }
    state.swipe_trace.clear();
    state.swipe_trace.push(Instant::now(), 0.0);
    state.swipe = Some(SwipeProgress {
        row: row_index,
        dx: 0.0,
        anim: SwipeAnim::Held,
    });
    state.gesture = MouseGesture::HorizontalSwipe {
        start_col: col,
        row: row_index,
    };
}

/// Deck row whose card covers the given terminal row, if any.
fn card_at_point(state: &AppState, inner: Rect, row: u16) -> Option<usize> {
    if row < inner.y || row >= inner.y + inner.height {
        return None;
    }
    let content_y = (row - inner.y) as f64 + state.view_offset.round();
    let mut top = 0.0;
    for (index, height) in state.controller.ledger().active_heights() {
        if content_y < top + height {
            return (content_y >= top).then_some(index);
        }
        top += height;
    }
    None
}

fn drag_horizontal(state: &mut AppState, col: u16) {
    let MouseGesture::HorizontalSwipe { start_col, row } = state.gesture else {
        return;
    };
    let dx = col as f64 - start_col as f64;
    state.swipe_trace.push(Instant::now(), dx);
    if let Some(swipe) = state.swipe.as_mut() {
        if swipe.row == row && swipe.anim == SwipeAnim::Held {
            swipe.dx = dx;
        }
    }
}

fn handle_release(state: &mut AppState) {
    match std::mem::take(&mut state.gesture) {
        MouseGesture::VerticalDrag { .. } => {
            // A pause before release counts as motion too.
            state.drag_trace.push(Instant::now(), state.view_offset);
            let velocity = state.drag_trace.velocity() * GESTURE_VELOCITY_GAIN;
            state.drag_trace.clear();
            let cmds = state.controller.end_drag(state.view_offset, velocity);
            apply_commands(state, cmds);
            let cmds = state.controller.on_scroll(state.view_offset);
            apply_commands(state, cmds);
        }
        MouseGesture::HorizontalSwipe { row, .. } => release_swipe(state, row),
        _ => {}
    }
}

fn release_swipe(state: &mut AppState, row: usize) {
    let dx = state.swipe.as_ref().map(|s| s.dx).unwrap_or(0.0);
    state.swipe_trace.push(Instant::now(), dx);
    let velocity = state.swipe_trace.velocity();
    state.swipe_trace.clear();

    let trigger = {
        let Some(swipe) = state.swipe.as_mut() else {
            return;
        };
        if swipe.row != row || swipe.anim != SwipeAnim::Held {
            return;
        }
        let scaled = velocity * GESTURE_VELOCITY_GAIN;
        if scaled.abs() >= SWIPE_TRIGGER_SPEED {
            // Keep the fling's direction and pace, never below the floor.
            let speed = velocity.abs().max(SLIDE_OUT_MIN_SPEED);
            swipe.anim = SwipeAnim::SlideOut {
                velocity: speed * scaled.signum(),
            };
            true
        } else {
            swipe.anim = SwipeAnim::SnapBack {
                tween: Tween::new(SNAP_BACK_MS),
                from_dx: swipe.dx,
            };
            false
        }
    };
    if trigger {
        let cmds = state.controller.request_dismiss(row);
        apply_commands(state, cmds);
    }
}

/// One wheel notch.  The first notch of a streak opens a synthetic drag;
/// the streak ends after [`WHEEL_SETTLE_MS`] of quiet (see `handle_tick`).
fn wheel_notch(state: &mut AppState, direction: i64) {
    if matches!(
        state.gesture,
        MouseGesture::VerticalDrag { .. } | MouseGesture::HorizontalSwipe { .. }
    ) {
        return;
    }
    if state.controller.dismissing_row().is_some() {
        return;
    }
    let now = Instant::now();
    if state.wheel_last.is_none() {
        state.glide = None;
        state.drag_trace.clear();
        state.drag_trace.push(now, state.view_offset);
        let cmds = state.controller.begin_drag(state.view_offset);
        apply_commands(state, cmds);
    }
    state.wheel_last = Some(now);

    let step = state.config.wheel_step as f64 * direction as f64;
    let offset = (state.view_offset + step).clamp(0.0, state.max_offset());
    state.view_offset = offset;
    state.drag_trace.push(now, offset);
    let cmds = state.controller.on_scroll(offset);
    apply_commands(state, cmds);
}

// ── Ticks (animation pump) ──────────────────────────────────────

/// Advance every running animation by one frame.
pub fn handle_tick(state: &mut AppState) {
    let now = Instant::now();
    let dt_ms = now.duration_since(state.last_tick).as_secs_f64() * 1000.0;
    // A suspended terminal must not replay as one giant frame.
    let dt_ms = dt_ms.min(100.0);
    state.last_tick = now;

    if state.controller.is_refreshing() {
        state.spinner_tick = state.spinner_tick.wrapping_add(1);
    }

    advance_glide(state);
    advance_swipe(state, dt_ms);
    advance_settle(state, dt_ms);
    finish_quiet_wheel(state, now);
}

fn advance_glide(state: &mut AppState) {
    let Some(glide) = state.glide else {
        return;
    };
    let (next, landed) = glide.step(state.view_offset);
    state.view_offset = next;
    if landed {
        state.glide = None;
    }
    let cmds = state.controller.on_scroll(next);
    apply_commands(state, cmds);
}

fn advance_swipe(state: &mut AppState, dt_ms: f64) {
    let width = state.terminal_area.width.max(1) as f64;
    let mut slid_out = false;
    let mut snapped_home = false;
    if let Some(swipe) = state.swipe.as_mut() {
        match &mut swipe.anim {
            SwipeAnim::Held => {}
            SwipeAnim::SlideOut { velocity } => {
                swipe.dx += *velocity * dt_ms;
                slid_out = swipe.dx.abs() >= width;
            }
            SwipeAnim::SnapBack { tween, from_dx } => {
                let finished = tween.advance(dt_ms as u64);
                swipe.dx = *from_dx * (1.0 - tween.eased());
                snapped_home = finished;
            }
        }
    }
    if snapped_home {
        state.swipe = None;
    }
    if slid_out {
        state.swipe = None;
        // The card is off-screen: fold the gap closed.
        let cmds = state.controller.notify_dismiss_stage();
        apply_commands(state, cmds);
    }
}

fn advance_settle(state: &mut AppState, dt_ms: f64) {
    let mut finished = false;
    if let Some(settle) = state.settle.as_mut() {
        finished = settle.tween.advance(dt_ms as u64);
    }
    if finished {
        let cmds = state.controller.notify_dismiss_stage();
        apply_commands(state, cmds);
        // CollapseGap normally clears this; a dismissed tail row has no gap
        // below it and emits none.
        state.settle = None;
    }
}

fn finish_quiet_wheel(state: &mut AppState, now: Instant) {
    let Some(last) = state.wheel_last else {
        return;
    };
    if now.duration_since(last) < Duration::from_millis(WHEEL_SETTLE_MS) {
        return;
    }
    state.wheel_last = None;
    let velocity = state.drag_trace.velocity() * GESTURE_VELOCITY_GAIN;
    state.drag_trace.clear();
    let cmds = state.controller.end_drag(state.view_offset, velocity);
    apply_commands(state, cmds);
    let cmds = state.controller.on_scroll(state.view_offset);
    apply_commands(state, cmds);
}

// ── Controller commands ─────────────────────────────────────────

/// Carry out the work the controller asked for.
pub fn apply_commands(state: &mut AppState, cmds: Vec<HostCommand>) {
    for cmd in cmds {
        match cmd {
            HostCommand::AnimateScrollTo { target } => {
                state.glide = Some(ScrollGlide::new(
                    target,
                    state.config.animation_speed.glide_factor(),
                ));
            }
            HostCommand::JumpScrollTo { target } => {
                state.glide = None;
                state.view_offset = target;
            }
            HostCommand::ToggleRow { index } => {
                if let Some(row) = state.rows.get_mut(index) {
                    row.expanded = !row.expanded;
                }
            }
            HostCommand::ShrinkRow { index } => {
                // A swipe release already owns the visual; a key dismissal
                // starts one from rest, leaving leftward at the floor speed.
                let owned = state
                    .swipe
                    .as_ref()
                    .is_some_and(|s| s.row == index && matches!(s.anim, SwipeAnim::SlideOut { .. }));
                if !owned {
                    state.swipe = Some(SwipeProgress {
                        row: index,
                        dx: 0.0,
                        anim: SwipeAnim::SlideOut {
                            velocity: -SLIDE_OUT_MIN_SPEED,
                        },
                    });
                }
            }
            HostCommand::SettleRow { index } => {
                let height = state.controller.ledger().height(index).unwrap_or(0.0);
                state.settle = Some(SettleAnim {
                    row: index,
                    height,
                    tween: Tween::new(SETTLE_MS),
                });
            }
            HostCommand::CollapseGap { index: _ } => {
                state.settle = None;
            }
            HostCommand::PersistDismiss { index } => {
                if let Some(id) = state.rows.get(index).map(|r| r.rec.id.clone()) {
                    state.store.mark_dismissed(&id);
                    state.queue_profile_write();
                    let event = &state.rows[index].rec.event;
                    state.status_message = Some(format!("Dismissed {event}"));
                }
            }
            HostCommand::SetSwipeShield { engaged } => {
                state.swipe_shield = engaged;
            }
        }
    }
}

fn point_in_rect(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::store::{demo_catalog, RecStore, SavedSort};
    use crate::ui::deck_widget::DeckRow;
    use chrono::NaiveDate;
    use crossterm::event::KeyModifiers as Mods;

    fn mouse(kind: MouseEventKind, col: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: col,
            row,
            modifiers: Mods::NONE,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, Mods::NONE)
    }

    /// Three 10-row cards in a 10-row viewport, terminal 40x13.
    fn test_state() -> AppState {
        let now = NaiveDate::from_ymd_opt(2024, 6, 7)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let catalog: Vec<_> = demo_catalog(now).into_iter().take(3).collect();
        let rows: Vec<DeckRow> = catalog.iter().cloned().map(DeckRow::new).collect();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let profile = std::env::temp_dir()
            .join("rec-deck-handler-tests")
            .join(format!("{}-{nanos}.profile", std::process::id()));
        let store = RecStore::with_profile_path(1, catalog, profile);
        let mut state = AppState::new(rows, store, AppConfig::defaults());
        state.fake_now = Some(now);
        state.terminal_area = Rect::new(0, 0, 40, 13);
        state.controller.set_viewport_height(10.0);
        for i in 0..3 {
            state.controller.report_row_height(i, 10.0);
        }
        state
    }

    /// Run ticks with a forced 40ms frame delta.
    fn run_ticks(state: &mut AppState, frames: usize) {
        for _ in 0..frames {
            state.last_tick = Instant::now() - Duration::from_millis(40);
            handle_tick(state);
        }
    }

    #[test]
    fn upward_pointer_drag_scrolls_the_deck_down() {
        let mut state = test_state();
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 10, 6));
        handle_mouse(&mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 10, 4));
        assert!(matches!(state.gesture, MouseGesture::VerticalDrag { .. }));
        assert!((state.view_offset - 2.0).abs() < 1e-9);
        assert!(state.controller.is_dragging());
        assert!(state.swipe_shield);
    }

    #[test]
    fn sideways_drag_on_the_current_card_follows_the_pointer() {
        let mut state = test_state();
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        handle_mouse(&mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 14, 5));
        let swipe = state.swipe.as_ref().expect("swipe should begin");
        assert_eq!(swipe.row, 0);
        assert!((swipe.dx - 4.0).abs() < 1e-9);
        assert_eq!(swipe.anim, SwipeAnim::Held);
    }

    #[test]
    fn swipe_beyond_the_card_area_is_refused() {
        let mut state = test_state();
        // Terminal row 11 is the deck's bottom border, not a card.
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 10, 11));
        handle_mouse(&mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 16, 11));
        assert!(state.swipe.is_none());
        assert_eq!(state.gesture, MouseGesture::Idle);
    }

    #[test]
    fn a_slow_swipe_release_snaps_the_card_back() {
        let mut state = test_state();
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        handle_mouse(&mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 13, 5));
        // Hold still long enough for the velocity window to forget the pull.
        std::thread::sleep(Duration::from_millis(110));
        handle_mouse(&mut state, mouse(MouseEventKind::Up(MouseButton::Left), 13, 5));
        let swipe = state.swipe.as_ref().expect("card is easing home");
        assert!(matches!(swipe.anim, SwipeAnim::SnapBack { .. }));
        assert!(state.controller.dismissing_row().is_none());

        run_ticks(&mut state, 10);
        assert!(state.swipe.is_none());
    }

    #[test]
    fn a_fast_swipe_release_starts_the_dismissal() {
        let mut state = test_state();
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        handle_mouse(&mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 16, 5));
        handle_mouse(&mut state, mouse(MouseEventKind::Up(MouseButton::Left), 16, 5));
        let swipe = state.swipe.as_ref().expect("card is sliding out");
        assert!(matches!(swipe.anim, SwipeAnim::SlideOut { .. }));
        assert_eq!(state.controller.dismissing_row(), Some(0));
    }

    #[test]
    fn dismissal_rides_ticks_through_to_removal() {
        let mut state = test_state();
        handle_key(&mut state, key(KeyCode::Char('x')));
        assert_eq!(state.controller.dismissing_row(), Some(0));
        assert!(matches!(
            state.swipe.as_ref().map(|s| &s.anim),
            Some(SwipeAnim::SlideOut { .. })
        ));

        run_ticks(&mut state, 30);
        assert!(state.controller.is_row_removed(0));
        assert!(state.swipe.is_none());
        assert!(state.settle.is_none());
        assert_eq!(state.controller.current().index, 1);
        assert_eq!(state.deck_position(), (1, 2));
        assert!(state.store.is_dismissed(&state.rows[0].rec.id));
    }

    #[test]
    fn wheel_notches_coalesce_into_one_drag() {
        let mut state = test_state();
        handle_mouse(&mut state, mouse(MouseEventKind::ScrollDown, 10, 5));
        handle_mouse(&mut state, mouse(MouseEventKind::ScrollDown, 10, 5));
        assert!(state.controller.is_dragging());
        assert!((state.view_offset - 6.0).abs() < 1e-9);
        assert!(state.wheel_last.is_some());

        // After the quiet period the streak ends and the deck snaps.
        state.wheel_last = Some(Instant::now() - Duration::from_millis(200));
        run_ticks(&mut state, 1);
        assert!(!state.controller.is_dragging());
        assert!(state.wheel_last.is_none());
    }

    #[test]
    fn next_card_key_pages_to_the_neighbor() {
        let mut state = test_state();
        handle_key(&mut state, key(KeyCode::Char('j')));
        assert_eq!(state.controller.current().index, 1);
        let glide = state.glide.expect("paging animates");
        assert!((glide.target() - 10.0).abs() < 1e-9);

        // Ride the glide to arrival; the deck rests pinned on card 1.
        run_ticks(&mut state, 60);
        assert!(state.glide.is_none());
        assert!((state.view_offset - 10.0).abs() < 1e-9);
    }

    #[test]
    fn save_key_hearts_the_current_card() {
        let mut state = test_state();
        handle_key(&mut state, key(KeyCode::Char('s')));
        assert!(state.rows[0].saved);
        assert!(state.store.is_saved(&state.rows[0].rec.id));
        handle_key(&mut state, key(KeyCode::Char('s')));
        assert!(!state.rows[0].saved);
    }

    #[test]
    fn expand_key_flips_the_current_row() {
        let mut state = test_state();
        handle_key(&mut state, key(KeyCode::Enter));
        assert!(state.rows[0].expanded);
        handle_key(&mut state, key(KeyCode::Enter));
        assert!(!state.rows[0].expanded);
    }

    #[test]
    fn saved_popup_opens_sorts_and_unsaves() {
        let mut state = test_state();
        state.config.saved_sort = SavedSort::History;
        handle_key(&mut state, key(KeyCode::Char('s')));
        handle_key(&mut state, key(KeyCode::Char('v')));
        assert_eq!(state.active_view, ActiveView::SavedList);
        assert!(state.saved.as_ref().is_some_and(|v| !v.sections.is_empty()));

        // Sort cycles in place.
        handle_key(&mut state, key(KeyCode::Tab));
        assert_eq!(
            state.saved.as_ref().map(|v| v.sort),
            Some(SavedSort::Upcoming)
        );

        // Unsave drops the entry and the deck heart with it.
        handle_key(&mut state, key(KeyCode::Tab));
        handle_key(&mut state, key(KeyCode::Delete));
        assert!(state.saved.as_ref().is_some_and(|v| v.sections.is_empty()));
        assert!(!state.rows[0].saved);

        handle_key(&mut state, key(KeyCode::Esc));
        assert_eq!(state.active_view, ActiveView::Deck);
        assert!(state.saved.is_none());
    }

    #[test]
    fn refresh_key_raises_the_flag_and_freezes_gestures() {
        let mut state = test_state();
        handle_key(&mut state, key(KeyCode::Char('r')));
        assert!(state.refresh_requested);
        assert_eq!(state.refresh_generation, 1);
        assert!(state.controller.is_refreshing());

        // Swipes are refused while the catalog is in flight.
        handle_mouse(&mut state, mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        handle_mouse(&mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 16, 5));
        assert!(state.swipe.is_none());
    }

    #[test]
    fn ctrl_c_quits_from_any_view() {
        let mut state = test_state();
        state.active_view = ActiveView::SettingsMenu;
        handle_key(
            &mut state,
            KeyEvent::new(KeyCode::Char('c'), Mods::CONTROL),
        );
        assert!(state.should_quit);
    }
}
