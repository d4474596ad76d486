//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── cards ──────────────────────────────────────────────────
    pub fn card_border_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn card_border_current_style() -> Style {
        Style::default().fg(Color::Magenta)
    }

    pub fn event_style() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn place_style() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn schedule_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    /// Schedule line while the event is actually running.
    pub fn happening_style() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn blurb_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn detail_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn label_style() -> Style {
        Style::default().fg(Color::Magenta)
    }

    pub fn saved_style() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn hint_style() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    }

    /// Applied on top of any card style while a swipe gesture holds the card.
    pub fn swiping(style: Style) -> Style {
        style.add_modifier(Modifier::DIM)
    }

    pub fn empty_deck_style() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // ── saved list ─────────────────────────────────────────────
    pub fn section_style() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }
}
