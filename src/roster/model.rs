use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// One duty assignment: who is on evening duty on a given calendar day.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DutyEntry {
    pub date: NaiveDate,
    pub person: String,
    pub role: Option<String>,
}

impl DutyEntry {
    pub fn new(date: NaiveDate, person: impl Into<String>, role: Option<String>) -> Self {
        Self {
            date,
            person: person.into(),
            role,
        }
    }

    /// Russian two-letter weekday abbreviation, as shown on the duty board.
    pub fn weekday(&self) -> &'static str {
        weekday_short(self.date)
    }
}

/// Russian two-letter abbreviation for a date's weekday (ПН..ВС).
pub fn weekday_short(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "ПН",
        Weekday::Tue => "ВТ",
        Weekday::Wed => "СР",
        Weekday::Thu => "ЧТ",
        Weekday::Fri => "ПТ",
        Weekday::Sat => "СБ",
        Weekday::Sun => "ВС",
    }
}

/// One fully-parsed snapshot of the duty schedule.
///
/// Entries are sorted by date ascending and dates are unique: when the
/// source sheet lists the same date twice, the last row wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    entries: Vec<DutyEntry>,
}

impl Roster {
    /// Build a roster from entries in sheet order. Later entries overwrite
    /// earlier ones for the same date; output is sorted ascending.
    pub fn from_entries(entries: impl IntoIterator<Item = DutyEntry>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, DutyEntry> = BTreeMap::new();
        for entry in entries {
            by_date.insert(entry.date, entry);
        }
        Self {
            entries: by_date.into_values().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[DutyEntry] {
        &self.entries
    }

    /// Entry for a single calendar day, if any.
    pub fn for_date(&self, date: NaiveDate) -> Option<&DutyEntry> {
        self.entries
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// All entries within [from, to] inclusive. Empty when nothing matches.
    pub fn in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<DutyEntry> {
        self.entries
            .iter()
            .filter(|e| e.date >= from && e.date <= to)
            .cloned()
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
