//! Saved-recommendations overlay: the ♥ list, grouped into sections.

use chrono::NaiveDateTime;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

use crate::core::rec::Recommendation;
use crate::core::store::{SavedSection, SavedSort};
use crate::ui::popup::centered_fixed;
use crate::ui::theme::Theme;

// ───────────────────────────────────────── geometry ──────────

/// One visual row of the saved list.  Selection walks entries only; headings
/// and blanks are skipped.
pub enum SavedListRow<'a> {
    Blank,
    Heading(&'static str),
    Entry {
        index: usize,
        rec: &'a Recommendation,
    },
}

/// Flatten sections into display rows, numbering entries across sections.
pub fn build_rows(sections: &[SavedSection]) -> Vec<SavedListRow<'_>> {
    let mut rows = Vec::new();
    let mut index = 0;
    for (s, section) in sections.iter().enumerate() {
        if s > 0 {
            rows.push(SavedListRow::Blank);
        }
        rows.push(SavedListRow::Heading(section.title));
        for rec in &section.recs {
            rows.push(SavedListRow::Entry { index, rec });
            index += 1;
        }
    }
    rows
}

/// Number of selectable entries in `rows`.
pub fn entry_count(rows: &[SavedListRow<'_>]) -> usize {
    rows.iter()
        .filter(|r| matches!(r, SavedListRow::Entry { .. }))
        .count()
}

/// Display-row position of entry `entry`, if present.
pub fn row_of_entry(rows: &[SavedListRow<'_>], entry: usize) -> Option<usize> {
    rows.iter()
        .position(|r| matches!(r, SavedListRow::Entry { index, .. } if *index == entry))
}

/// The popup rectangle for a given terminal area.
pub fn popup_area(area: Rect) -> Rect {
    let w = area.width.saturating_sub(6).min(72).max(30);
    let h = area.height.saturating_sub(2).min(22).max(8);
    centered_fixed(w, h, area)
}

/// Rows of list the popup can show at once (borders and hint bar excluded).
pub fn list_viewport_rows(area: Rect) -> usize {
    popup_area(area).height.saturating_sub(4) as usize
}

// ───────────────────────────────────────── widget ────────────

/// The saved list overlay.
pub struct SavedPopup<'a> {
    pub sections: &'a [SavedSection],
    pub sort: SavedSort,
    pub selected: usize,
    pub scroll: usize,
    /// Whether anything is saved at all (drives the empty-state wording).
    pub any_saved: bool,
    pub now: NaiveDateTime,
}

impl Widget for SavedPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = popup_area(area);
        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" Saved ♥s — {} ", self.sort.label()))
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(popup);
        block.render(popup, buf);
        if inner.height < 3 || inner.width < 10 {
            return;
        }

        let rows = build_rows(self.sections);
        let list_rows = inner.height.saturating_sub(2) as usize;

        let mut lines = Vec::new();
        if rows.is_empty() {
            let msg = if self.any_saved {
                "You have no upcoming ♥s"
            } else {
                "You have no saved ♥s"
            };
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                format!("  {msg}"),
                Theme::empty_deck_style(),
            )));
        } else {
            for row in rows.iter().skip(self.scroll).take(list_rows) {
                lines.push(self.list_line(row, inner.width as usize));
            }
        }

        while lines.len() < list_rows {
            lines.push(Line::raw(""));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  s: sort  del: unsave  Esc: close",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}

impl SavedPopup<'_> {
    fn list_line(&self, row: &SavedListRow<'_>, width: usize) -> Line<'static> {
        match row {
            SavedListRow::Blank => Line::raw(""),
            SavedListRow::Heading(title) => Line::from(Span::styled(
                format!(" {title}"),
                Theme::section_style(),
            )),
            SavedListRow::Entry { index, rec } => {
                let selected = *index == self.selected;
                let prefix = if selected { " ▸ " } else { "   " };
                let name = rec.event.clone();
                let detail = format!("  {} · {}", rec.schedule(self.now), rec.place);
                let over = rec.is_over(self.now);

                let (name_style, detail_style) = if selected {
                    (
                        Theme::selected_style().fg(Color::White),
                        Theme::selected_style().fg(Color::Gray),
                    )
                } else if over {
                    (Theme::detail_style(), Theme::detail_style())
                } else {
                    (Theme::event_style(), Theme::schedule_style())
                };

                // Pad the tail so a selected row highlights edge to edge.
                let used = prefix.chars().count() + name.chars().count() + detail.chars().count();
                let pad = " ".repeat(width.saturating_sub(used));
                Line::from(vec![
                    Span::styled(format!("{prefix}{name}"), name_style),
                    Span::styled(format!("{detail}{pad}"), detail_style),
                ])
            }
        }
    }
}
