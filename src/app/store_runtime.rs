//! Background catalog and profile I/O to keep the UI thread responsive.
//!
//! Catalog reloads are stamped with a generation so the main loop can drop
//! deliveries the user has already refreshed past.  Profile writes funnel
//! through a single worker thread, so the file on disk is always the most
//! recently queued state.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::handler::apply_commands;
use super::state::AppState;
use crate::core::rec::Recommendation;
use crate::core::store::{demo_catalog, load_catalog};
use crate::ui::deck_widget::DeckRow;

/// Simulated reload latency, long enough to see the spinner.
const RELOAD_LATENCY_MS: u64 = 1500;

/// Messages from background store workers to the main loop.
#[derive(Debug)]
pub enum StoreUpdate {
    /// A catalog reload finished (or failed).
    CatalogLoaded(Result<Vec<Recommendation>, String>),
}

/// One queued profile write.
#[derive(Debug)]
pub struct ProfileWrite {
    pub path: PathBuf,
    pub contents: String,
}

/// Start the profile writer thread.  It drains its queue in send order and
/// exits once the sender side is dropped.
pub fn spawn_profile_writer() -> (mpsc::Sender<ProfileWrite>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<ProfileWrite>();
    let handle = std::thread::spawn(move || {
        while let Ok(write) = rx.recv() {
            if let Some(parent) = write.path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(err) = std::fs::write(&write.path, &write.contents) {
                warn!("profile write to {} failed: {err}", write.path.display());
            }
        }
    });
    (tx, handle)
}

/// Reload the catalog off the UI thread.
pub fn spawn_catalog_reload(
    tx: tokio::sync::mpsc::UnboundedSender<(u64, StoreUpdate)>,
    generation: u64,
    path: Option<PathBuf>,
    now: NaiveDateTime,
) {
    std::thread::spawn(move || {
        // A local file loads instantly; keep the latency so a refresh feels
        // like a fetch either way.
        std::thread::sleep(Duration::from_millis(RELOAD_LATENCY_MS));
        let result = match path {
            Some(path) => load_catalog(&path).map_err(|e| e.to_string()),
            None => Ok(demo_catalog(now)),
        };
        let _ = tx.send((generation, StoreUpdate::CatalogLoaded(result)));
    });
}

/// Fold a store worker message into the app.
pub fn apply_store_update(state: &mut AppState, generation: u64, update: StoreUpdate) {
    match update {
        StoreUpdate::CatalogLoaded(result) => {
            if generation != state.refresh_generation {
                debug!("dropping stale catalog delivery (generation {generation})");
                return;
            }
            match result {
                Ok(catalog) => {
                    state.store.set_catalog(catalog);
                    let fresh = state.store.fresh_recommendations();
                    state.rows = fresh
                        .iter()
                        .map(|rec| {
                            let mut row = DeckRow::new(rec.clone());
                            row.saved = state.store.is_saved(&rec.id);
                            row
                        })
                        .collect();
                    let count = state.rows.len();
                    let cmds = state.controller.finish_refresh(count);
                    apply_commands(state, cmds);
                    state.status_message = Some(match count {
                        0 => "No recommendations right now".into(),
                        1 => "Found 1 recommendation".into(),
                        n => format!("Found {n} recommendations"),
                    });
                }
                Err(err) => {
                    state.controller.cancel_refresh();
                    warn!("catalog reload failed: {err}");
                    state.status_message = Some(format!("Refresh failed: {err}"));
                }
            }
        }
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::store::RecStore;
    use chrono::NaiveDate;

    fn sample_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 7)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    fn refreshing_state(catalog_len: usize) -> AppState {
        let catalog: Vec<_> = demo_catalog(sample_now())
            .into_iter()
            .take(catalog_len)
            .collect();
        let rows: Vec<DeckRow> = catalog.iter().cloned().map(DeckRow::new).collect();
        let profile = std::env::temp_dir()
            .join("rec-deck-store-runtime-tests")
            .join(format!("{}.profile", std::process::id()));
        let store = RecStore::with_profile_path(7, catalog, profile);
        let mut state = AppState::new(rows, store, AppConfig::defaults());
        state.fake_now = Some(sample_now());
        state.controller.set_viewport_height(10.0);
        for i in 0..catalog_len {
            state.controller.report_row_height(i, 10.0);
        }
        state.refresh_generation = 3;
        state.controller.set_refreshing();
        state
    }

    #[test]
    fn fresh_catalog_replaces_the_deck() {
        let mut state = refreshing_state(3);
        let delivery = demo_catalog(sample_now()).into_iter().take(5).collect();
        apply_store_update(&mut state, 3, StoreUpdate::CatalogLoaded(Ok(delivery)));

        assert!(!state.controller.is_refreshing());
        assert_eq!(state.rows.len(), 5);
        assert_eq!(state.controller.ledger().active_rows(), 5);
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("5 recommendations")));
    }

    #[test]
    fn stale_generations_are_dropped() {
        let mut state = refreshing_state(3);
        let delivery = demo_catalog(sample_now()).into_iter().take(5).collect();
        apply_store_update(&mut state, 2, StoreUpdate::CatalogLoaded(Ok(delivery)));

        assert!(state.controller.is_refreshing());
        assert_eq!(state.rows.len(), 3);
    }

    #[test]
    fn dismissed_entries_stay_out_of_a_reloaded_deck() {
        let mut state = refreshing_state(3);
        let gone = state.rows[1].rec.id.clone();
        state.store.mark_dismissed(&gone);

        let delivery = demo_catalog(sample_now()).into_iter().take(3).collect();
        apply_store_update(&mut state, 3, StoreUpdate::CatalogLoaded(Ok(delivery)));

        assert_eq!(state.rows.len(), 2);
        assert!(state.rows.iter().all(|r| r.rec.id != gone));
    }

    #[test]
    fn failed_reload_stands_the_deck_back_up() {
        let mut state = refreshing_state(3);
        apply_store_update(
            &mut state,
            3,
            StoreUpdate::CatalogLoaded(Err("catalog unreachable".into())),
        );

        assert!(!state.controller.is_refreshing());
        assert_eq!(state.rows.len(), 3);
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Refresh failed")));
    }
}
