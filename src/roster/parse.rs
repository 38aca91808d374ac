//! Converts raw sheet rows into a [`Roster`].
//!
//! The source sheet is loosely structured: a date-like first column
//! (`ДД.ММ.ГГГГ` or `ДД.ММ`), a name column, and an optional role column.
//! Rows that don't fit are skipped with a warning rather than aborting the
//! whole parse - partial success is the default policy.

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{DutyEntry, Roster};

/// A row the parser had to skip, with the sheet row number (1-based) and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub row: usize,
    pub reason: String,
}

impl ParseWarning {
    fn new(row_idx: usize, reason: impl Into<String>) -> Self {
        Self {
            row: row_idx + 1,
            reason: reason.into(),
        }
    }
}

/// Parse raw rows into a roster plus row-level warnings.
///
/// `default_year` fills in short `ДД.ММ` dates. A header row (first row
/// whose first cell is not a date) is skipped silently; any later row with
/// an unparseable date or an empty name is skipped with a warning.
pub fn parse(rows: &[Vec<String>], default_year: i32) -> (Roster, Vec<ParseWarning>) {
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let date_cell = row.first().map(String::as_str).unwrap_or("").trim();
        let date = match parse_date_cell(date_cell, default_year) {
            Some(d) => d,
            None => {
                // Header row: first non-empty row without a parseable date.
                if idx == 0 {
                    continue;
                }
                warnings.push(ParseWarning::new(
                    idx,
                    format!("unparseable date: {:?}", date_cell),
                ));
                continue;
            }
        };

        let person = clean_name(row.get(1).map(String::as_str).unwrap_or(""));
        if person.is_empty() {
            warnings.push(ParseWarning::new(idx, "empty name"));
            continue;
        }

        let role = row
            .get(2)
            .map(|cell| clean_name(cell))
            .filter(|r| !r.is_empty());

        entries.push(DutyEntry::new(date, person, role));
    }

    (Roster::from_entries(entries), warnings)
}

/// Parse a date cell in `ДД.ММ.ГГГГ` or `ДД.ММ` form (the year defaults
/// to `default_year` for the short form). Anything else is `None`.
pub fn parse_date_cell(cell: &str, default_year: i32) -> Option<NaiveDate> {
    let cell = cell.trim();
    let parts: Vec<&str> = cell.split('.').collect();

    let (day_s, month_s, year_s) = match parts.as_slice() {
        [d, m] => (*d, *m, None),
        [d, m, y] => (*d, *m, Some(*y)),
        _ => return None,
    };

    if day_s.is_empty() || day_s.len() > 2 || !day_s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if month_s.is_empty() || month_s.len() > 2 || !month_s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year = match year_s {
        Some(y) => {
            if y.len() != 4 || !y.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            y.parse().ok()?
        }
        None => default_year,
    };

    let day: u32 = day_s.parse().ok()?;
    let month: u32 = month_s.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Clean a name cell: drop parenthesised comments and `с ЧЧ:ММ` time notes,
/// turn `<br>` into a comma separator, and collapse whitespace.
pub fn clean_name(raw: &str) -> String {
    let mut s = raw.replace("<br>", ", ");
    s = strip_parenthesized(&s);

    let mut tokens: Vec<&str> = Vec::new();
    let words: Vec<&str> = s.split_whitespace().collect();
    let mut i = 0;
    while i < words.len() {
        // "с 17:00" style notes - drop the pair.
        if words[i] == "с" && i + 1 < words.len() && looks_like_time(words[i + 1]) {
            i += 2;
            continue;
        }
        tokens.push(words[i]);
        i += 1;
    }

    tokens
        .join(" ")
        .trim_matches(|c| c == ' ' || c == ',')
        .to_string()
}

fn strip_parenthesized(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn looks_like_time(word: &str) -> bool {
    let word = word.trim_matches([',', '.']);
    let Some((h, m)) = word.split_once(':') else {
        return false;
    };
    !h.is_empty()
        && h.len() <= 2
        && h.bytes().all(|b| b.is_ascii_digit())
        && m.len() == 2
        && m.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Tests
// ============================================================================
