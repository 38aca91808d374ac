//! Duty roster domain model and sheet-row parser.
//!
//! A [`Roster`] is one fully-parsed snapshot of the duty schedule:
//! date-unique, sorted [`DutyEntry`] values. [`parse`] turns the untyped
//! rows coming off the spreadsheet into that strict shape, collecting
//! per-row [`ParseWarning`]s instead of failing on malformed input.

pub mod model;
pub mod parse;

pub use model::{weekday_short, DutyEntry, Roster};
pub use parse::{clean_name, parse, parse_date_cell, ParseWarning};
