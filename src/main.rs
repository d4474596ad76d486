//! A snap-paged deck of event recommendations for the terminal.
//!
//! Run the binary to browse the built-in demo catalog. Use `--catalog FILE`
//! to load your own deck and `--user N` to keep separate profiles.

mod app;
mod config;
mod core;
mod ui;

use std::io::stderr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    widgets::{Block, BorderType, Borders, Paragraph},
    Terminal,
};

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::{ActiveView, AppState, SwipeAnim},
    store_runtime::{self, StoreUpdate},
};
use crate::core::store::{demo_catalog, load_catalog, RecStore};
use crate::ui::{
    deck_widget::{CardLayout, DeckRow, DeckWidget, SettleVisual, SwipeVisual},
    layout::AppLayout,
    popup,
    saved::SavedPopup,
    spinner::RefreshIndicator,
    theme::Theme,
};

/// Animation frame cadence.
const TICK_MS: u64 = 35;

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Snap-paged recommendation deck")]
struct Cli {
    /// Catalog file to load (defaults to the built-in demo deck).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Profile to load and save (♥s and dismissals).
    #[arg(long, default_value_t = 1)]
    user: u32,

    /// Freeze the clock at `YYYY-MM-DD HH:MM` (for demos).
    #[arg(long)]
    now: Option<String>,
}

// ───────────────────────────────────────── main ──────────────

#[tokio::main]
async fn main() -> Result<()> {
    // The TUI owns stderr, so logs go to a file and only when asked.
    if let Ok(path) = std::env::var("REC_DECK_LOG") {
        let log_file = std::fs::File::create(&path)
            .with_context(|| format!("opening log file {path}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::sync::Mutex::new(log_file))
            .with_ansi(false)
            .init();
    }

    let cli = Cli::parse();

    let fake_now = match &cli.now {
        Some(s) => Some(
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
                .context("--now expects YYYY-MM-DD HH:MM")?,
        ),
        None => None,
    };
    let now = fake_now.unwrap_or_else(|| chrono::Local::now().naive_local());

    // ── build the initial deck ────────────────────────────────
    let catalog = match &cli.catalog {
        Some(path) => {
            load_catalog(path).with_context(|| format!("loading catalog {}", path.display()))?
        }
        None => demo_catalog(now),
    };
    let store = RecStore::open(cli.user, catalog);
    let rows: Vec<DeckRow> = store
        .fresh_recommendations()
        .into_iter()
        .map(|rec| {
            let saved = store.is_saved(&rec.id);
            let mut row = DeckRow::new(rec);
            row.saved = saved;
            row
        })
        .collect();

    let user_config = config::AppConfig::load();
    let mut state = AppState::new(rows, store, user_config);
    state.fake_now = fake_now;

    let (profile_tx, profile_writer) = store_runtime::spawn_profile_writer();
    state.profile_tx = Some(profile_tx);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    // ── async channels ────────────────────────────────────────
    let mut events = spawn_event_reader(Duration::from_millis(TICK_MS));
    let (store_tx, mut store_rx) = tokio::sync::mpsc::unbounded_channel::<(u64, StoreUpdate)>();

    // ── event loop ────────────────────────────────────────────
    loop {
        // Draw first so input always lands on the frame it was aimed at.
        terminal.draw(|frame| {
            state.terminal_area = frame.area();
            let layout = AppLayout::from_area(frame.area());
            let now = state.now();

            let (position, total) = state.deck_position();
            let title = if total == 0 {
                " rec-deck ".to_string()
            } else {
                format!(" rec-deck — card {position}/{total} ")
            };
            let deck_block = Block::default()
                .title(title)
                .title_style(Theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::border_style());

            // Measure before building the widget: heights depend on the
            // frame's width and each row's expansion.
            let inner = deck_block.inner(layout.deck_area);
            state.controller.set_viewport_height(inner.height as f64);
            let card_layout = CardLayout::for_area(inner, now, state.config.show_hints);
            for (i, row) in state.rows.iter().enumerate() {
                let height = card_layout.height(&row.rec, row.expanded);
                state.controller.report_row_height(i, height);
            }

            let swipe_visual = state.swipe.as_ref().map(|s| SwipeVisual {
                row: s.row,
                dx: s.dx,
                held: matches!(s.anim, SwipeAnim::Held),
            });
            let settle_visual = state.settle.as_ref().map(|s| SettleVisual {
                row: s.row,
                shift: s.height * s.tween.eased(),
            });

            let deck_widget = DeckWidget::new(&state.rows, state.controller.ledger(), now)
                .show_hints(state.config.show_hints)
                .current(state.controller.current().index)
                .view_offset(state.view_offset)
                .swipe(swipe_visual)
                .settle(settle_visual)
                .block(deck_block);
            frame.render_widget(deck_widget, layout.deck_area);

            frame.render_widget(
                RefreshIndicator {
                    visible: state.controller.is_refreshing(),
                    tick: state.spinner_tick,
                },
                layout.deck_area,
            );

            let hint = state.config.status_bar_hint();
            let status_text = match state.active_view {
                ActiveView::Deck => state.status_message.as_deref().unwrap_or(&hint),
                ActiveView::SettingsMenu | ActiveView::ControlsSubmenu | ActiveView::SavedList => {
                    ""
                }
            };
            let status = Paragraph::new(status_text).style(Theme::status_bar_style());
            frame.render_widget(status, layout.status_area);

            match state.active_view {
                ActiveView::SettingsMenu => {
                    frame.render_widget(popup::SettingsPopup { state: &state }, frame.area());
                }
                ActiveView::ControlsSubmenu => {
                    frame.render_widget(
                        popup::ControlsPopup {
                            config: &state.config,
                            selected: state.controls_selected,
                            awaiting_rebind: state.awaiting_rebind,
                        },
                        frame.area(),
                    );
                }
                ActiveView::SavedList => {
                    if let Some(view) = &state.saved {
                        frame.render_widget(
                            SavedPopup {
                                sections: &view.sections,
                                sort: view.sort,
                                selected: view.selected,
                                scroll: view.scroll,
                                any_saved: !state.store.saved_recommendations().is_empty(),
                                now,
                            },
                            frame.area(),
                        );
                    }
                }
                ActiveView::Deck => {}
            }
        })?;

        // Kick off reloads AFTER draw so the spinner shows immediately.
        if state.refresh_requested {
            state.refresh_requested = false;
            store_runtime::spawn_catalog_reload(
                store_tx.clone(),
                state.refresh_generation,
                cli.catalog.clone(),
                state.now(),
            );
        }

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => handler::handle_key(&mut state, k),
                    AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m),
                    AppEvent::Resize(w, h) => state.terminal_area = Rect::new(0, 0, w, h),
                    AppEvent::Tick => handler::handle_tick(&mut state),
                }
            }

            Some((generation, update)) = store_rx.recv() => {
                store_runtime::apply_store_update(&mut state, generation, update);
                // Drain everything currently queued without blocking.
                while let Ok((gen, upd)) = store_rx.try_recv() {
                    store_runtime::apply_store_update(&mut state, gen, upd);
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Dropping the sender lets the profile writer drain its queue and exit.
    state.profile_tx = None;
    if profile_writer.join().is_err() {
        tracing::warn!("profile writer exited abnormally");
    }

    Ok(())
}
