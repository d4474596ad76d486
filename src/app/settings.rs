//! Settings menu model (data only).
//!
//! Keeping these definitions outside the input handler lets both the handler
//! and UI renderers consume the same source of truth without cross-importing.

use super::state::{ActiveView, AppState};

/// A single item in the settings menu.
pub enum SettingsItem {
    /// Opens a submenu.
    Submenu {
        label: &'static str,
        view: ActiveView,
    },
    /// Boolean toggle — reads/writes via accessors on `AppState`.
    Toggle {
        label: &'static str,
        get: fn(&AppState) -> bool,
        set: fn(&mut AppState, bool),
    },
    /// Cycles through a finite set of values.
    Cycle {
        label: &'static str,
        value: fn(&AppState) -> String,
        cycle: fn(&mut AppState),
    },
}

impl SettingsItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Submenu { label, .. }
            | Self::Toggle { label, .. }
            | Self::Cycle { label, .. } => label,
        }
    }

    /// Value column shown in the settings popup.
    pub fn value_text(&self, state: &AppState) -> String {
        match self {
            Self::Submenu { .. } => "›".into(),
            Self::Toggle { get, .. } => {
                if get(state) {
                    "[ON]".into()
                } else {
                    "[OFF]".into()
                }
            }
            Self::Cycle { value, .. } => value(state),
        }
    }
}

/// All items shown in the settings popup, in display order.
pub static SETTINGS_ITEMS: &[SettingsItem] = &[
    SettingsItem::Submenu {
        label: "Controls",
        view: ActiveView::ControlsSubmenu,
    },
    SettingsItem::Cycle {
        label: "Animation Speed",
        value: |s| s.config.animation_speed.label().to_string(),
        cycle: |s| {
            s.config.animation_speed = s.config.animation_speed.next();
            let _ = s.config.save();
            s.status_message = Some(format!(
                "Animation speed: {}",
                s.config.animation_speed.label()
            ));
        },
    },
    SettingsItem::Cycle {
        label: "Wheel Step",
        value: |s| format!("{} rows", s.config.wheel_step),
        cycle: |s| {
            const STEPS: &[u16] = &[1, 2, 3, 5];
            let idx = STEPS.iter().position(|&w| w == s.config.wheel_step).unwrap_or(2);
            s.config.wheel_step = STEPS[(idx + 1) % STEPS.len()];
            let _ = s.config.save();
            s.status_message = Some(format!("Wheel step: {} rows", s.config.wheel_step));
        },
    },
    SettingsItem::Cycle {
        label: "Default Saved Sort",
        value: |s| s.config.saved_sort.label().to_string(),
        cycle: |s| {
            s.config.saved_sort = s.config.saved_sort.next();
            let _ = s.config.save();
            s.status_message = Some(format!("Saved sort: {}", s.config.saved_sort.label()));
        },
    },
    SettingsItem::Toggle {
        label: "Show Card Hints",
        get: |s| s.config.show_hints,
        set: |s, v| {
            s.config.show_hints = v;
            let _ = s.config.save();
        },
    },
];
