//! Recommendation records: an event happening at a place.

use chrono::{Datelike, NaiveDateTime};

/// One recommendation as the deck renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Stable id, unique within the catalog.
    pub id: String,
    /// Event headline.
    pub event: String,
    /// Venue name.
    pub place: String,
    /// Event description; the collapsed card shows a truncated preview.
    pub blurb: String,
    pub labels: Vec<String>,
    pub starts: NaiveDateTime,
    pub ends: NaiveDateTime,
    /// Street address, single line.
    pub address: String,
    /// The venue's opening hours, free-form.
    pub hours: String,
}

impl Recommendation {
    /// True once the event has ended.
    pub fn is_over(&self, now: NaiveDateTime) -> bool {
        now >= self.ends
    }

    /// True while the event is running.
    pub fn is_happening(&self, now: NaiveDateTime) -> bool {
        now >= self.starts && now < self.ends
    }

    /// Human schedule line, e.g. `Today, 9:00pm – 1:00am`.
    pub fn schedule(&self, now: NaiveDateTime) -> String {
        let day = if self.starts.date() == now.date() {
            "Today".to_string()
        } else if self.starts.date() == now.date().succ_opt().unwrap_or(now.date()) {
            "Tomorrow".to_string()
        } else if self.starts.iso_week() == now.iso_week() {
            self.starts.format("%A").to_string()
        } else {
            self.starts.format("%A, %b %-d").to_string()
        };
        format!(
            "{day}, {} – {}",
            self.starts.format("%-I:%M%P"),
            self.ends.format("%-I:%M%P"),
        )
    }

    /// Label line, e.g. `jazz · nightlife · late`.
    pub fn label_line(&self) -> String {
        self.labels.join(" · ")
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 2, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn rec(starts: NaiveDateTime, ends: NaiveDateTime) -> Recommendation {
        Recommendation {
            id: "jazz-night".into(),
            event: "Late Night Jazz".into(),
            place: "Green Mill".into(),
            blurb: String::new(),
            labels: vec!["jazz".into(), "nightlife".into()],
            starts,
            ends,
            address: String::new(),
            hours: String::new(),
        }
    }

    #[test]
    fn schedule_names_the_day_relative_to_now() {
        let now = at(17, 17, 30);
        assert_eq!(
            rec(at(17, 21, 0), at(18, 1, 0)).schedule(now),
            "Today, 9:00pm – 1:00am"
        );
        assert_eq!(
            rec(at(18, 19, 0), at(18, 22, 0)).schedule(now),
            "Tomorrow, 7:00pm – 10:00pm"
        );
        // Same ISO week: weekday name only (2016-02-17 is a Wednesday).
        assert_eq!(
            rec(at(20, 12, 0), at(20, 14, 0)).schedule(now),
            "Saturday, 12:00pm – 2:00pm"
        );
        assert_eq!(
            rec(at(27, 12, 0), at(27, 14, 0)).schedule(now),
            "Saturday, Feb 27, 12:00pm – 2:00pm"
        );
    }

    #[test]
    fn over_and_happening_follow_the_event_window() {
        let r = rec(at(17, 21, 0), at(18, 1, 0));
        assert!(!r.is_over(at(17, 17, 30)));
        assert!(!r.is_happening(at(17, 17, 30)));
        assert!(r.is_happening(at(17, 22, 0)));
        assert!(r.is_over(at(18, 1, 0)));
        assert!(!r.is_happening(at(18, 1, 0)));
    }
}
