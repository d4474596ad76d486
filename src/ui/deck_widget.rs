//! The card deck widget: full-height recommendation cards stacked
//! vertically, scrolled by a fractional row offset.
//!
//! Layout is shared with the host through [`CardLayout`]: the same code that
//! renders a card also measures it, so the heights reported to the scroll
//! controller always match what ends up on screen.  All card text is built
//! as per-line `(text, style)` pairs rather than span trees — a swiped card
//! is drawn shifted and cropped by whole columns, which is cheap on strings
//! and fiddly on spans.

use chrono::NaiveDateTime;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

use crate::core::ledger::HeightLedger;
use crate::core::rec::Recommendation;
use crate::ui::theme::Theme;

// ───────────────────────────────────────── deck rows ─────────

/// One deck entry: a recommendation plus its presentation state.
#[derive(Debug, Clone)]
pub struct DeckRow {
    pub rec: Recommendation,
    pub expanded: bool,
    pub saved: bool,
}

impl DeckRow {
    pub fn new(rec: Recommendation) -> Self {
        Self {
            rec,
            expanded: false,
            saved: false,
        }
    }
}

// ───────────────────────────────────────── card layout ───────

/// One line of card body text.  Single style per line.
#[derive(Debug, Clone)]
pub struct CardLine {
    pub text: String,
    pub style: Style,
}

impl CardLine {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn blank() -> Self {
        Self::new("", Style::default())
    }
}

/// Shared card geometry for one frame: the measurer and the renderer both
/// derive everything from this, so reported heights match drawn heights.
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub width: u16,
    pub viewport_rows: usize,
    pub now: NaiveDateTime,
    pub show_hints: bool,
}

impl CardLayout {
    /// Layout for the deck's inner (border-free) area.
    pub fn for_area(inner: Rect, now: NaiveDateTime, show_hints: bool) -> Self {
        Self {
            width: inner.width,
            viewport_rows: inner.height as usize,
            now,
            show_hints,
        }
    }

    /// Card height in rows, borders included.  Collapsed cards always fill
    /// the viewport exactly; expanded cards grow with their content but
    /// never shrink below it.
    pub fn height(&self, rec: &Recommendation, expanded: bool) -> f64 {
        (self.body(rec, expanded).len() + 2) as f64
    }

    /// The card's body lines (everything between the two border rows).
    pub fn body(&self, rec: &Recommendation, expanded: bool) -> Vec<CardLine> {
        if expanded {
            self.expanded_body(rec)
        } else {
            self.collapsed_body(rec)
        }
    }

    fn text_width(&self) -> usize {
        // "│ " + text + " │"
        self.width.saturating_sub(4) as usize
    }

    fn collapsed_body(&self, rec: &Recommendation) -> Vec<CardLine> {
        let tw = self.text_width();
        let body_h = self.viewport_rows.saturating_sub(2).max(1);

        let mut head = vec![
            CardLine::new(truncate(&rec.event, tw), Theme::event_style()),
            CardLine::new(truncate(&rec.place, tw), Theme::place_style()),
            self.schedule_line(rec, tw),
        ];
        let mut tail = Vec::new();
        if !rec.labels.is_empty() {
            tail.push(CardLine::new(
                truncate(&rec.label_line(), tw),
                Theme::label_style(),
            ));
        }
        if self.show_hints && body_h >= 8 {
            tail.push(CardLine::new("enter expands · x dismisses", Theme::hint_style()));
        }

        // Tiny viewport: keep whatever fits, headline first.
        if body_h < head.len() + tail.len() + 2 {
            head.truncate(body_h);
            pad_to(&mut head, body_h);
            return head;
        }

        let mid_h = body_h - head.len() - tail.len() - 1;
        let mut mid = wrap(&rec.blurb, tw);
        if mid.len() > mid_h {
            mid.truncate(mid_h);
            if let Some(last) = mid.last_mut() {
                ellipsize(last, tw);
            }
        }

        let mut lines = head;
        lines.push(CardLine::blank());
        lines.extend(
            mid.into_iter()
                .map(|l| CardLine::new(l, Theme::blurb_style())),
        );
        pad_to(&mut lines, body_h - tail.len());
        lines.extend(tail);
        lines
    }

    fn expanded_body(&self, rec: &Recommendation) -> Vec<CardLine> {
        let tw = self.text_width();
        let mut lines = vec![
            CardLine::new(truncate(&rec.event, tw), Theme::event_style()),
            CardLine::new(truncate(&rec.place, tw), Theme::place_style()),
            self.schedule_line(rec, tw),
            CardLine::blank(),
        ];
        lines.extend(
            wrap(&rec.blurb, tw)
                .into_iter()
                .map(|l| CardLine::new(l, Theme::blurb_style())),
        );
        lines.push(CardLine::blank());
        lines.push(CardLine::new(truncate(&rec.address, tw), Theme::detail_style()));
        lines.push(CardLine::new(truncate(&rec.hours, tw), Theme::detail_style()));
        if !rec.labels.is_empty() {
            lines.push(CardLine::blank());
            lines.push(CardLine::new(
                truncate(&rec.label_line(), tw),
                Theme::label_style(),
            ));
        }
        if self.show_hints {
            lines.push(CardLine::new("enter collapses", Theme::hint_style()));
        }
        pad_to(&mut lines, self.viewport_rows.saturating_sub(2));
        lines
    }

    fn schedule_line(&self, rec: &Recommendation, tw: usize) -> CardLine {
        if rec.is_happening(self.now) {
            CardLine::new(
                truncate(&format!("{} · happening now", rec.schedule(self.now)), tw),
                Theme::happening_style(),
            )
        } else {
            CardLine::new(truncate(&rec.schedule(self.now), tw), Theme::schedule_style())
        }
    }
}

// ───────────────────────────────────────── text helpers ──────

/// Greedy word wrap; words longer than `width` are hard-split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    if width == 0 {
        return out;
    }
    let mut line = String::new();
    let mut used = 0usize;
    for word in text.split_whitespace() {
        let mut word = word;
        loop {
            let wlen = word.chars().count();
            if used == 0 && wlen >= width {
                let cut = word
                    .char_indices()
                    .nth(width)
                    .map_or(word.len(), |(i, _)| i);
                out.push(word[..cut].to_string());
                word = &word[cut..];
                if word.is_empty() {
                    break;
                }
                continue;
            }
            let sep = usize::from(used != 0);
            if used + sep + wlen <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                used += sep + wlen;
                break;
            }
            out.push(std::mem::take(&mut line));
            used = 0;
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
    out
}

/// Truncate to `width` chars, marking any cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut s: String = text.chars().take(width).collect();
    ellipsize(&mut s, width);
    s
}

/// Make room for a trailing `…` within `width` chars.
fn ellipsize(line: &mut String, width: usize) {
    while line.chars().count() >= width.max(1) {
        line.pop();
    }
    line.push('…');
}

fn pad_to(lines: &mut Vec<CardLine>, len: usize) {
    while lines.len() < len {
        lines.push(CardLine::blank());
    }
}

// ───────────────────────────────────────── widget ────────────

/// Horizontal displacement of a card under (or released from) a swipe.
#[derive(Debug, Clone, Copy)]
pub struct SwipeVisual {
    pub row: usize,
    /// Columns right of rest; negative values move left.
    pub dx: f64,
    /// True while the pointer still holds the card (drawn dimmed).
    pub held: bool,
}

/// The deck closing over a dismissed card: rows below `row` draw `shift`
/// rows higher than their content offset says.
#[derive(Debug, Clone, Copy)]
pub struct SettleVisual {
    pub row: usize,
    pub shift: f64,
}

/// The deck itself.  Borrows everything; build one per frame.
pub struct DeckWidget<'a> {
    rows: &'a [DeckRow],
    ledger: &'a HeightLedger,
    now: NaiveDateTime,
    show_hints: bool,
    current: usize,
    view_offset: f64,
    swipe: Option<SwipeVisual>,
    settle: Option<SettleVisual>,
    block: Option<Block<'a>>,
}

impl<'a> DeckWidget<'a> {
    pub fn new(rows: &'a [DeckRow], ledger: &'a HeightLedger, now: NaiveDateTime) -> Self {
        Self {
            rows,
            ledger,
            now,
            show_hints: true,
            current: 0,
            view_offset: 0.0,
            swipe: None,
            settle: None,
            block: None,
        }
    }

    pub fn show_hints(mut self, on: bool) -> Self {
        self.show_hints = on;
        self
    }

    pub fn current(mut self, index: usize) -> Self {
        self.current = index;
        self
    }

    pub fn view_offset(mut self, offset: f64) -> Self {
        self.view_offset = offset;
        self
    }

    pub fn swipe(mut self, visual: Option<SwipeVisual>) -> Self {
        self.swipe = visual;
        self
    }

    pub fn settle(mut self, visual: Option<SettleVisual>) -> Self {
        self.settle = visual;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn draw_card(
        &self,
        buf: &mut Buffer,
        inner: Rect,
        layout: &CardLayout,
        index: usize,
        row: &DeckRow,
        y: i64,
        height: i64,
    ) {
        let (dx, held) = match self.swipe {
            Some(s) if s.row == index => (s.dx.round() as i64, s.held),
            _ => (0, false),
        };
        if dx.unsigned_abs() >= u64::from(inner.width) {
            return;
        }

        let mut border = if index == self.current {
            Theme::card_border_current_style()
        } else {
            Theme::card_border_style()
        };
        if held {
            border = Theme::swiping(border);
        }

        let w = inner.width as usize;
        let tw = layout.text_width();
        let body = layout.body(&row.rec, row.expanded);

        for r in 0..height {
            let sy = y + r;
            if sy < 0 || sy >= i64::from(inner.height) {
                continue;
            }
            let sy = inner.y + sy as u16;

            let segments: Vec<(String, Style)> = if r == 0 {
                top_border(w, row.saved, border)
            } else if r == height - 1 {
                vec![(format!("╰{}╯", "─".repeat(w.saturating_sub(2))), border)]
            } else {
                let line = body
                    .get(r as usize - 1)
                    .cloned()
                    .unwrap_or_else(CardLine::blank);
                let style = if held { Theme::swiping(line.style) } else { line.style };
                vec![
                    ("│ ".to_string(), border),
                    (format!("{:<tw$}", line.text), style),
                    (" │".to_string(), border),
                ]
            };
            draw_segments(buf, inner.x, sy, inner.width, dx, &segments);
        }
    }
}

/// `╭─ ♥ ──…──╮` when saved, a plain run of dashes otherwise.
fn top_border(w: usize, saved: bool, border: Style) -> Vec<(String, Style)> {
    if saved && w >= 8 {
        vec![
            ("╭─".to_string(), border),
            (" ♥ ".to_string(), Theme::saved_style()),
            (format!("{}╮", "─".repeat(w.saturating_sub(6))), border),
        ]
    } else {
        vec![(format!("╭{}╮", "─".repeat(w.saturating_sub(2))), border)]
    }
}

/// Draw a row of styled segments shifted by `dx` columns: positive values
/// move right (clipped at the area edge), negative crop from the left.
fn draw_segments(buf: &mut Buffer, x: u16, y: u16, width: u16, dx: i64, segments: &[(String, Style)]) {
    let mut skip = if dx < 0 { (-dx) as usize } else { 0 };
    let mut cur_x = x + if dx > 0 { dx as u16 } else { 0 };
    let end_x = x + width;
    for (text, style) in segments {
        if cur_x >= end_x {
            break;
        }
        let chars = text.chars().count();
        if skip >= chars {
            skip -= chars;
            continue;
        }
        let visible: String = text
            .chars()
            .skip(skip)
            .take((end_x - cur_x) as usize)
            .collect();
        skip = 0;
        let shown = visible.chars().count() as u16;
        buf.set_string(cur_x, y, &visible, *style);
        cur_x += shown;
    }
}

impl Widget for DeckWidget<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block.take() {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width < 8 || inner.height == 0 {
            return;
        }
        let layout = CardLayout::for_area(inner, self.now, self.show_hints);

        if self.rows.is_empty() || self.ledger.active_rows() == 0 {
            let msg = "No recommendations available.";
            let y = inner.y + inner.height / 2;
            let x = inner.x + inner.width.saturating_sub(msg.len() as u16) / 2;
            buf.set_string(x, y, msg, Theme::empty_deck_style());
            if inner.height >= 3 {
                let hint = "r looks for more";
                let x = inner.x + inner.width.saturating_sub(hint.len() as u16) / 2;
                buf.set_string(x, y + 1, hint, Theme::hint_style());
            }
            return;
        }

        let scroll = self.view_offset.round() as i64;
        let settle_shift = self
            .settle
            .map(|s| s.shift.round() as i64)
            .unwrap_or(0);

        let mut content_top = 0i64;
        for (i, row) in self.rows.iter().enumerate() {
            if self.ledger.is_removed(i) {
                continue;
            }
            let h = layout.height(&row.rec, row.expanded) as i64;
            let mut y = content_top - scroll;
            content_top += h;

            if let Some(settle) = self.settle {
                if i == settle.row {
                    // The settling card already slid off-screen; its slot
                    // shrinks via the shift applied to everything below.
                    continue;
                }
                if i > settle.row {
                    y -= settle_shift;
                }
            }
            if y >= i64::from(inner.height) || y + h <= 0 {
                continue;
            }
            self.draw_card(buf, inner, &layout, i, row, y, h);
        }
    }
}

// ───────────────────────────────────────── tests ─────────────
