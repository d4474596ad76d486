//! User configuration — keybindings and persistence.
//!
//! Settings are stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/rec-deck/config.toml` (default `~/.config/rec-deck/config.toml`).

use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::store::SavedSort;

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the deck view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PrevCard,
    NextCard,
    ToggleExpand,
    ToggleSave,
    Dismiss,
    Refresh,
    OpenSaved,
    OpenSettings,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the controls menu).
    pub const ALL: &[Action] = &[
        Action::PrevCard,
        Action::NextCard,
        Action::ToggleExpand,
        Action::ToggleSave,
        Action::Dismiss,
        Action::Refresh,
        Action::OpenSaved,
        Action::OpenSettings,
        Action::Quit,
    ];

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            Action::PrevCard => "Previous Card",
            Action::NextCard => "Next Card",
            Action::ToggleExpand => "Expand / Collapse",
            Action::ToggleSave => "Save / Unsave",
            Action::Dismiss => "Dismiss Card",
            Action::Refresh => "Refresh Deck",
            Action::OpenSaved => "Saved ♥s",
            Action::OpenSettings => "Open Settings",
            Action::Quit => "Quit",
        }
    }

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::PrevCard => "prev_card",
            Action::NextCard => "next_card",
            Action::ToggleExpand => "toggle_expand",
            Action::ToggleSave => "toggle_save",
            Action::Dismiss => "dismiss",
            Action::Refresh => "refresh",
            Action::OpenSaved => "open_saved",
            Action::OpenSettings => "open_settings",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        match s {
            "prev_card" => Some(Action::PrevCard),
            "next_card" => Some(Action::NextCard),
            "toggle_expand" => Some(Action::ToggleExpand),
            "toggle_save" => Some(Action::ToggleSave),
            "dismiss" => Some(Action::Dismiss),
            "refresh" => Some(Action::Refresh),
            "open_saved" => Some(Action::OpenSaved),
            "open_settings" => Some(Action::OpenSettings),
            "quit" => Some(Action::Quit),
            _ => None,
        }
    }
}

// ───────────────────────────────────────── speed preset ──────

/// Scroll glide speed presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl AnimationSpeed {
    pub fn label(self) -> &'static str {
        match self {
            AnimationSpeed::Slow => "Slow",
            AnimationSpeed::Normal => "Normal",
            AnimationSpeed::Fast => "Fast",
        }
    }

    /// Fraction of the remaining distance a scroll glide covers per tick.
    pub fn glide_factor(self) -> f64 {
        match self {
            AnimationSpeed::Slow => 0.15,
            AnimationSpeed::Normal => 0.25,
            AnimationSpeed::Fast => 0.40,
        }
    }

    pub fn next(self) -> Self {
        match self {
            AnimationSpeed::Slow => AnimationSpeed::Normal,
            AnimationSpeed::Normal => AnimationSpeed::Fast,
            AnimationSpeed::Fast => AnimationSpeed::Slow,
        }
    }

    fn config_value(self) -> &'static str {
        match self {
            AnimationSpeed::Slow => "slow",
            AnimationSpeed::Normal => "normal",
            AnimationSpeed::Fast => "fast",
        }
    }

    fn from_config_value(s: &str) -> Option<Self> {
        match s {
            "slow" => Some(AnimationSpeed::Slow),
            "normal" => Some(AnimationSpeed::Normal),
            "fast" => Some(AnimationSpeed::Fast),
            _ => None,
        }
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding — key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Create a binding from a raw key event (used during rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        Self {
            code: event.code,
            modifiers: event.modifiers & mask,
        }
    }

    /// User-friendly display string (e.g. `"Alt+↑"`, `"Ctrl+c"`, `"q"`).
    pub fn display(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::Backspace => "Bksp".into(),
            KeyCode::Delete => "Del".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PgUp".into(),
            KeyCode::PageDown => "PgDn".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Serialise to config-file format (e.g. `"Alt+Up"`, `"Ctrl+c"`, `"q"`).
    fn to_config_string(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Left => "Left".into(),
            KeyCode::Right => "Right".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            KeyCode::Backspace => "Backspace".into(),
            KeyCode::Delete => "Delete".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"Alt+Up"`, `"q"`, `"Enter"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            s if s.starts_with('f') && s.len() > 1 => {
                let n: u8 = s[1..].parse().ok()?;
                KeyCode::F(n)
            }
            s if s.len() == 1 => KeyCode::Char(s.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration — keybindings and deck settings.
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Scroll glide speed preset.
    pub animation_speed: AnimationSpeed,
    /// Rows the deck moves per mouse-wheel notch.
    pub wheel_step: u16,
    /// Sort the saved list opens with.
    pub saved_sort: SavedSort,
    /// Show the key-hint line at the bottom of each card.
    pub show_hints: bool,
}

impl AppConfig {
    /// Hard-coded default keybindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(PrevCard, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(NextCard, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(ToggleExpand, vec![KeyBind::new(Enter, n)]);
        m.insert(ToggleSave, vec![KeyBind::new(Char('s'), n)]);
        m.insert(Dismiss, vec![KeyBind::new(Char('x'), n), KeyBind::new(Delete, n)]);
        m.insert(Refresh, vec![KeyBind::new(Char('r'), n)]);
        m.insert(OpenSaved, vec![KeyBind::new(Char('v'), n)]);
        m.insert(OpenSettings, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match (shouldn't happen after conflict resolution), the one with
    /// the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Add a binding for `action`.  Removes this key from any other action
    /// to prevent conflicts, then appends it to `action`'s bindings.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for (_, binds) in self.bindings.iter_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    /// Restore all bindings to the built-in defaults.
    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Format the binding list for a given action (e.g. `"↑/k"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(|b| b.display()).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    /// Short display of the first binding only (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}: cards | {}: expand | {}: save | {}: dismiss | {}: ♥s | {}: settings",
            self.short_binding(Action::NextCard),
            self.short_binding(Action::ToggleExpand),
            self.short_binding(Action::ToggleSave),
            self.short_binding(Action::Dismiss),
            self.short_binding(Action::OpenSaved),
            self.short_binding(Action::OpenSettings),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                return Self::parse_config(&contents);
            }
        }
        Self::defaults()
    }

    /// Built-in defaults, used when no config file exists.
    pub fn defaults() -> Self {
        Self {
            bindings: Self::default_bindings(),
            animation_speed: AnimationSpeed::default(),
            wheel_step: 3,
            saved_sort: SavedSort::Upcoming,
            show_hints: true,
        }
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::defaults();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            // Deck settings.
            match key {
                "animation_speed" => {
                    if let Some(speed) = AnimationSpeed::from_config_value(value) {
                        config.animation_speed = speed;
                    }
                    continue;
                }
                "wheel_step" => {
                    if let Ok(v) = value.parse::<u16>() {
                        // Keep this bounded for predictable scrolling.
                        config.wheel_step = v.clamp(1, 10);
                    }
                    continue;
                }
                "saved_sort" => {
                    if let Some(sort) = saved_sort_from_config(value) {
                        config.saved_sort = sort;
                    }
                    continue;
                }
                "show_hints" => {
                    config.show_hints = value == "true";
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# rec-deck configuration".to_string(),
            String::new(),
            "# Deck settings".to_string(),
            format!("animation_speed = {}", self.animation_speed.config_value()),
            format!("wheel_step = {}", self.wheel_step),
            format!("saved_sort = {}", saved_sort_config_value(self.saved_sort)),
            format!("show_hints = {}", self.show_hints),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            "# Special keys: Up, Down, Left, Right, Enter, Esc, Tab,".to_string(),
            "#   Backspace, Delete, Home, End, PageUp, PageDown, Space, F1-F12".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

fn saved_sort_config_value(sort: SavedSort) -> &'static str {
    match sort {
        SavedSort::Upcoming => "upcoming",
        SavedSort::History => "history",
    }
}

fn saved_sort_from_config(s: &str) -> Option<SavedSort> {
    match s {
        "upcoming" => Some(SavedSort::Upcoming),
        "history" => Some(SavedSort::History),
        _ => None,
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/rec-deck/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("rec-deck").join("config.toml")
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_its_own_format() {
        let mut config = AppConfig::defaults();
        config.animation_speed = AnimationSpeed::Fast;
        config.wheel_step = 5;
        config.saved_sort = SavedSort::History;
        config.show_hints = false;
        config.add_binding(Action::Dismiss, KeyBind::new(KeyCode::Char('d'), KeyModifiers::CONTROL));

        let parsed = AppConfig::parse_config(&config.serialise());
        assert_eq!(parsed.animation_speed, AnimationSpeed::Fast);
        assert_eq!(parsed.wheel_step, 5);
        assert_eq!(parsed.saved_sort, SavedSort::History);
        assert!(!parsed.show_hints);
        assert_eq!(
            parsed.match_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Some(Action::Dismiss),
        );
    }

    #[test]
    fn unknown_lines_fall_back_to_defaults() {
        let parsed = AppConfig::parse_config("garbage\nwheel_step = lots\nrefresh = F5\n");
        assert_eq!(parsed.wheel_step, 3);
        assert_eq!(
            parsed.match_key(KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE)),
            Some(Action::Refresh),
        );
        // Untouched actions keep their defaults.
        assert_eq!(
            parsed.match_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::Quit),
        );
    }
}
