//! Read-only query façade over the cached roster.
//!
//! Everything here reads the last published snapshot; nothing on this
//! path performs network I/O. A date with no entry yields an empty
//! result, never an error.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use crate::cache::RosterCache;
use crate::roster::{weekday_short, DutyEntry, Roster};

/// Weeks shown on the duty board grid.
const WEEKS_SHOWN: u64 = 2;

/// Working days per row: Monday through Saturday.
const DAYS_PER_WEEK: u64 = 6;

/// One cell of the duty board grid. Days without an assignment keep an
/// empty person so the grid stays rectangular.
#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub date_str: String,
    pub weekday: &'static str,
    pub person: String,
    pub role: Option<String>,
}

impl DayCell {
    fn from_entry(entry: &DutyEntry) -> Self {
        Self {
            date: entry.date,
            date_str: entry.date.format("%d.%m").to_string(),
            weekday: entry.weekday(),
            person: entry.person.clone(),
            role: entry.role.clone(),
        }
    }

    fn blank(date: NaiveDate) -> Self {
        Self {
            date,
            date_str: date.format("%d.%m").to_string(),
            weekday: weekday_short(date),
            person: String::new(),
            role: None,
        }
    }
}

/// The interface the HTTP layer uses to read roster data.
#[derive(Clone)]
pub struct RosterQuery {
    cache: Arc<RosterCache>,
    tz: Tz,
}

impl RosterQuery {
    pub fn new(cache: Arc<RosterCache>, tz: Tz) -> Self {
        Self { cache, tz }
    }

    /// Today's calendar date in the configured server timezone.
    pub fn today_date(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Duty entries for the current date (zero or one).
    pub fn today(&self) -> Vec<DutyEntry> {
        self.on_date(self.today_date())
    }

    /// Duty entries for a single date.
    pub fn on_date(&self, date: NaiveDate) -> Vec<DutyEntry> {
        let Some(snap) = self.cache.snapshot() else {
            return Vec::new();
        };
        snap.roster.for_date(date).cloned().into_iter().collect()
    }

    /// Duty entries within [from, to] inclusive.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> Vec<DutyEntry> {
        let Some(snap) = self.cache.snapshot() else {
            return Vec::new();
        };
        snap.roster.in_range(from, to)
    }

    /// Two working weeks (Mon-Sat) around today, blanks filled in for
    /// dates the sheet doesn't cover.
    pub fn upcoming_weeks(&self) -> Vec<Vec<DayCell>> {
        let roster = self
            .cache
            .snapshot()
            .map(|snap| snap.roster.clone())
            .unwrap_or_default();
        work_week_grid(&roster, self.today_date())
    }
}

/// Build the duty board grid starting from the Monday of `today`'s week.
/// On a Sunday the board rolls over to the week starting tomorrow.
fn work_week_grid(roster: &Roster, today: NaiveDate) -> Vec<Vec<DayCell>> {
    let week_start = if today.weekday() == Weekday::Sun {
        today + Duration::days(1)
    } else {
        today - Duration::days(today.weekday().num_days_from_monday() as i64)
    };

    (0..WEEKS_SHOWN)
        .map(|week| {
            (0..DAYS_PER_WEEK)
                .map(|day| {
                    let date = week_start + Duration::days((week * 7 + day) as i64);
                    match roster.for_date(date) {
                        Some(entry) => DayCell::from_entry(entry),
                        None => DayCell::blank(date),
                    }
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Yekaterinburg;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn loaded_cache() -> Arc<RosterCache> {
        let cache = Arc::new(RosterCache::new());
        cache.publish_success(
            Roster::from_entries(vec![
                DutyEntry::new(d(2024, 3, 1), "Иванов", None),
                DutyEntry::new(d(2024, 3, 2), "Петров", Some("Сменный".into())),
            ]),
            vec![],
        );
        cache
    }

    #[test]
    fn test_on_date_hit_and_miss() {
        let query = RosterQuery::new(loaded_cache(), Yekaterinburg);
        assert_eq!(query.on_date(d(2024, 3, 1)).len(), 1);
        assert!(query.on_date(d(2024, 3, 15)).is_empty());
    }

    #[test]
    fn test_range_reads_snapshot_only() {
        let query = RosterQuery::new(loaded_cache(), Yekaterinburg);
        let hits = query.range(d(2024, 3, 1), d(2024, 3, 31));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_empty_cache_yields_empty_results() {
        let query = RosterQuery::new(Arc::new(RosterCache::new()), Yekaterinburg);
        assert!(query.on_date(d(2024, 3, 1)).is_empty());
        assert!(query.range(d(2024, 3, 1), d(2024, 3, 31)).is_empty());
        // Grid is still rectangular with blanks.
        let weeks = query.upcoming_weeks();
        assert_eq!(weeks.len(), 2);
        assert!(weeks.iter().all(|w| w.len() == 6));
    }

    #[test]
    fn test_grid_starts_on_monday() {
        let roster = Roster::from_entries(vec![DutyEntry::new(d(2024, 3, 6), "Иванов", None)]);
        // 2024-03-06 is a Wednesday; its week starts Monday 03-04.
        let weeks = work_week_grid(&roster, d(2024, 3, 6));
        assert_eq!(weeks[0][0].date, d(2024, 3, 4));
        assert_eq!(weeks[0][0].weekday, "ПН");
        assert_eq!(weeks[0][2].person, "Иванов");
        assert_eq!(weeks[1][0].date, d(2024, 3, 11));
    }

    #[test]
    fn test_grid_sunday_rolls_to_next_week() {
        let roster = Roster::default();
        // 2024-03-03 is a Sunday; the board shows the week starting Monday 03-04.
        let weeks = work_week_grid(&roster, d(2024, 3, 3));
        assert_eq!(weeks[0][0].date, d(2024, 3, 4));
    }

    #[test]
    fn test_grid_excludes_sundays() {
        let weeks = work_week_grid(&Roster::default(), d(2024, 3, 6));
        for week in &weeks {
            assert!(week.iter().all(|cell| cell.weekday != "ВС"));
        }
    }
}
