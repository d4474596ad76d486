//! Recommendation store — the catalog plus one user's saved/dismissed state.
//!
//! Catalogs and per-user profiles are simple key-value text files.  The
//! profile lives at `$XDG_DATA_HOME/rec-deck/user-<id>.toml` (default
//! `~/.local/share/rec-deck/user-<id>.toml`); saved order is preserved
//! because the history view lists hearts in the order they were given.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

use crate::core::rec::Recommendation;

// ───────────────────────────────────────── catalog ───────────

/// What went wrong reading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

fn parse_err(line: usize, msg: impl Into<String>) -> CatalogError {
    CatalogError::Parse {
        line,
        msg: msg.into(),
    }
}

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M";

/// Parse a catalog: `[id]` section headers followed by `key = value` lines.
pub fn parse_catalog(text: &str) -> Result<Vec<Recommendation>, CatalogError> {
    struct Partial {
        header_line: usize,
        id: String,
        event: String,
        place: String,
        blurb: String,
        labels: Vec<String>,
        starts: Option<NaiveDateTime>,
        ends: Option<NaiveDateTime>,
        address: String,
        hours: String,
    }

    fn flush(partial: Partial) -> Result<Recommendation, CatalogError> {
        let line = partial.header_line;
        if partial.event.is_empty() {
            return Err(parse_err(line, format!("[{}] has no event", partial.id)));
        }
        let Some(starts) = partial.starts else {
            return Err(parse_err(line, format!("[{}] has no starts", partial.id)));
        };
        let Some(ends) = partial.ends else {
            return Err(parse_err(line, format!("[{}] has no ends", partial.id)));
        };
        Ok(Recommendation {
            id: partial.id,
            event: partial.event,
            place: partial.place,
            blurb: partial.blurb,
            labels: partial.labels,
            starts,
            ends,
            address: partial.address,
            hours: partial.hours,
        })
    }

    let mut out = Vec::new();
    let mut current: Option<Partial> = None;
    for (n, raw) in text.lines().enumerate() {
        let lineno = n + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[') {
            let id = header.trim_end_matches(']').trim();
            if id.is_empty() {
                return Err(parse_err(lineno, "empty recommendation id"));
            }
            if let Some(done) = current.take() {
                out.push(flush(done)?);
            }
            current = Some(Partial {
                header_line: lineno,
                id: id.to_string(),
                event: String::new(),
                place: String::new(),
                blurb: String::new(),
                labels: Vec::new(),
                starts: None,
                ends: None,
                address: String::new(),
                hours: String::new(),
            });
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(parse_err(lineno, format!("expected `key = value`, got `{line}`")));
        };
        let Some(partial) = current.as_mut() else {
            return Err(parse_err(lineno, "field before any [id] header"));
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "event" => partial.event = value.to_string(),
            "place" => partial.place = value.to_string(),
            "blurb" => partial.blurb = value.to_string(),
            "address" => partial.address = value.to_string(),
            "hours" => partial.hours = value.to_string(),
            "labels" => {
                partial.labels = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            "starts" | "ends" => {
                let ts = NaiveDateTime::parse_from_str(value, DATETIME_FMT).map_err(|_| {
                    parse_err(
                        lineno,
                        format!("bad datetime `{value}` (expected YYYY-MM-DD HH:MM)"),
                    )
                })?;
                if key == "starts" {
                    partial.starts = Some(ts);
                } else {
                    partial.ends = Some(ts);
                }
            }
            other => return Err(parse_err(lineno, format!("unknown field `{other}`"))),
        }
    }
    if let Some(done) = current.take() {
        out.push(flush(done)?);
    }
    Ok(out)
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<Recommendation>, CatalogError> {
    let text = std::fs::read_to_string(path)?;
    parse_catalog(&text)
}

// ───────────────────────────────────────── demo deck ─────────

/// Built-in catalog so the binary is usable with no arguments.  Dates are
/// laid out around `now`: something running right now, tonight's picks, the
/// rest of the week, and one already-over show for the history view.
pub fn demo_catalog(now: NaiveDateTime) -> Vec<Recommendation> {
    let rec = |id: &str,
               event: &str,
               place: &str,
               from_h: i64,
               dur_h: i64,
               labels: &[&str],
               address: &str,
               hours: &str,
               blurb: &str| {
        Recommendation {
            id: id.to_string(),
            event: event.to_string(),
            place: place.to_string(),
            blurb: blurb.to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            starts: now + Duration::hours(from_h),
            ends: now + Duration::hours(from_h + dur_h),
            address: address.to_string(),
            hours: hours.to_string(),
        }
    };
    vec![
        rec(
            "green-mill-jazz",
            "Late Night Jazz Session",
            "Green Mill Cocktail Lounge",
            -1,
            5,
            &["jazz", "nightlife", "classic"],
            "4802 N Broadway Ave",
            "Daily 12pm to 2am",
            "The house quartet runs an open session under the original 1907 \
             decor. No cover before nine; the back booths fill first, and the \
             bar keeps a short list of rye nobody regrets.",
        ),
        rec(
            "emporium-arcade",
            "Pinball League Night",
            "Emporium Logan Square",
            3,
            4,
            &["arcade", "beer", "late"],
            "2363 N Milwaukee Ave",
            "Mon–Fri 4pm–2am, weekends noon–3am",
            "Forty cabinets, a rotating tap wall, and a league bracket that \
             welcomes walk-ins. Quarters at the door, high scores on the \
             chalkboard.",
        ),
        rec(
            "hideout-open-mic",
            "Songwriter Open Mic",
            "The Hideout",
            22,
            3,
            &["music", "intimate"],
            "1354 W Wabansia Ave",
            "Shows most nights from 7pm",
            "A tiny balloon-frame house behind the factories where half the \
             city's songwriters tried their first verse. Sign-up sheet goes \
             out at seven sharp.",
        ),
        rec(
            "revolution-tap",
            "Anti-Hero Tap Takeover",
            "Revolution Brewing Taproom",
            27,
            5,
            &["beer", "tour"],
            "3340 N Kedzie Ave",
            "Tue–Sun noon–10pm",
            "Brewery floor tours on the hour and the full hop-forward lineup \
             pouring, including two casks that never leave the building.",
        ),
        rec(
            "music-box-midnight",
            "Midnight Matinee: Suspiria",
            "Music Box Theatre",
            52,
            2,
            &["film", "late", "classic"],
            "3733 N Southport Ave",
            "Box office opens 30 min before first show",
            "The organist plays the house in, the ceiling twinkles, and the \
             print is a proper 35mm with all the reds intact.",
        ),
        rec(
            "promontory-brunch",
            "Vinyl Brunch",
            "The Promontory",
            64,
            4,
            &["brunch", "vinyl", "family"],
            "5311 S Lake Park Ave W",
            "Weekends 10am–3pm, evenings from 6pm",
            "Two turntables and a biscuit menu. All-ages until three, crates \
             are strictly soul and disco before noon.",
        ),
        rec(
            "garfield-conservatory",
            "Night Bloom Walk",
            "Garfield Park Conservatory",
            75,
            3,
            &["plants", "quiet", "walk"],
            "300 N Central Park Ave",
            "Daily 10am–5pm, Wed to 8pm",
            "After-hours access to the desert house while the night-blooming \
             cereus does its once-a-year trick. Docents wander, lights stay \
             low.",
        ),
        rec(
            "empty-bottle-early",
            "Early Show: Touring Trio",
            "Empty Bottle",
            -26,
            3,
            &["music", "cheap"],
            "1035 N Western Ave",
            "Doors at 8pm most nights",
            "Monday's free show, gone before it happened — kept around so \
             the history view has something to remember.",
        ),
    ]
}

// ───────────────────────────────────────── saved view ────────

/// Sort modes for the saved view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedSort {
    Upcoming,
    History,
}

impl SavedSort {
    pub fn label(self) -> &'static str {
        match self {
            SavedSort::Upcoming => "Upcoming",
            SavedSort::History => "History",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SavedSort::Upcoming => SavedSort::History,
            SavedSort::History => SavedSort::Upcoming,
        }
    }
}

/// One titled run of recommendations in the saved view.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSection {
    pub title: &'static str,
    pub recs: Vec<Recommendation>,
}

// ───────────────────────────────────────── store ─────────────

/// The catalog plus one user's saved and dismissed ids.
#[derive(Debug)]
pub struct RecStore {
    user: u32,
    catalog: Vec<Recommendation>,
    /// Saved ids in the order the user saved them.
    saved: Vec<String>,
    dismissed: HashSet<String>,
    profile_path: PathBuf,
}

impl RecStore {
    /// Open the store for `user`, loading any existing profile from disk.
    pub fn open(user: u32, catalog: Vec<Recommendation>) -> Self {
        Self::with_profile_path(user, catalog, profile_path(user))
    }

    /// Like [`RecStore::open`] with an explicit profile location.
    pub fn with_profile_path(user: u32, catalog: Vec<Recommendation>, path: PathBuf) -> Self {
        let (saved, dismissed) = match std::fs::read_to_string(&path) {
            Ok(text) => parse_profile(&text),
            Err(_) => (Vec::new(), HashSet::new()),
        };
        debug!(
            "store open: user {user}, {} catalog entries, {} saved, {} dismissed",
            catalog.len(),
            saved.len(),
            dismissed.len(),
        );
        Self {
            user,
            catalog,
            saved,
            dismissed,
            profile_path: path,
        }
    }

    pub fn user(&self) -> u32 {
        self.user
    }

    pub fn catalog(&self) -> &[Recommendation] {
        &self.catalog
    }

    /// Swap in a freshly loaded catalog (refresh).
    pub fn set_catalog(&mut self, catalog: Vec<Recommendation>) {
        self.catalog = catalog;
    }

    pub fn get(&self, id: &str) -> Option<&Recommendation> {
        self.catalog.iter().find(|r| r.id == id)
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.saved.iter().any(|s| s == id)
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    /// Save or unsave a recommendation; returns whether it is saved now.
    pub fn toggle_saved(&mut self, id: &str) -> bool {
        if self.is_saved(id) {
            self.saved.retain(|s| s != id);
            false
        } else {
            self.saved.push(id.to_string());
            true
        }
    }

    /// Record a dismissal.  Idempotent; the deck guarantees it is only
    /// asked for once per completed swipe.
    pub fn mark_dismissed(&mut self, id: &str) {
        self.dismissed.insert(id.to_string());
    }

    /// The deck's rows: every catalog entry the user has not dismissed.
    pub fn fresh_recommendations(&self) -> Vec<Recommendation> {
        self.catalog
            .iter()
            .filter(|r| !self.dismissed.contains(&r.id))
            .cloned()
            .collect()
    }

    /// Saved recommendations, in the order they were saved.
    pub fn saved_recommendations(&self) -> Vec<Recommendation> {
        self.saved
            .iter()
            .filter_map(|id| self.get(id))
            .cloned()
            .collect()
    }

    /// Sectioned contents of the saved view.  `Upcoming` filters out ended
    /// events and splits the rest around `now`; `History` keeps everything
    /// in saved order.
    pub fn saved_sections(&self, sort: SavedSort, now: NaiveDateTime) -> Vec<SavedSection> {
        let saved = self.saved_recommendations();
        match sort {
            SavedSort::History => {
                if saved.is_empty() {
                    Vec::new()
                } else {
                    vec![SavedSection {
                        title: "History",
                        recs: saved,
                    }]
                }
            }
            SavedSort::Upcoming => {
                let mut happening: Vec<Recommendation> = Vec::new();
                let mut upcoming: Vec<Recommendation> = Vec::new();
                for rec in saved {
                    if rec.is_over(now) {
                        continue;
                    }
                    if rec.is_happening(now) {
                        happening.push(rec);
                    } else {
                        upcoming.push(rec);
                    }
                }
                happening.sort_by_key(|r| r.starts);
                upcoming.sort_by_key(|r| r.starts);
                let mut out = Vec::new();
                if !happening.is_empty() {
                    out.push(SavedSection {
                        title: "Happening Now",
                        recs: happening,
                    });
                }
                if !upcoming.is_empty() {
                    out.push(SavedSection {
                        title: "Upcoming",
                        recs: upcoming,
                    });
                }
                out
            }
        }
    }

    // ── persistence ─────────────────────────────────────────────

    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    /// Profile file contents for the current state.
    pub fn serialise_profile(&self) -> String {
        let mut lines = vec![
            "# rec-deck profile".to_string(),
            format!("user = {}", self.user),
            format!("saved = {}", self.saved.join(", ")),
            format!(
                "dismissed = {}",
                self.dismissed.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
        ];
        lines.push(String::new());
        lines.join("\n")
    }

    /// Write the profile to disk now.  The app normally hands this to a
    /// background worker; the synchronous path covers shutdown.
    pub fn save_profile(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.profile_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.profile_path, self.serialise_profile())?;
        Ok(())
    }
}

/// Lenient profile parse; unknown keys are ignored.
fn parse_profile(text: &str) -> (Vec<String>, HashSet<String>) {
    let mut saved = Vec::new();
    let mut dismissed = HashSet::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let ids = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        match key.trim() {
            "saved" => saved = ids.collect(),
            "dismissed" => dismissed = ids.collect(),
            _ => {}
        }
    }
    (saved, dismissed)
}

/// Profile path for a user (`$XDG_DATA_HOME/rec-deck/user-<id>.toml`).
fn profile_path(user: u32) -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".local").join("share")
        });
    data_dir.join("rec-deck").join(format!("user-{user}.toml"))
}

// ───────────────────────────────────────── tests ─────────────
