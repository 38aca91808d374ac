//! Google Sheets access for the duty schedule.
//!
//! This module provides the [`SheetsClient`] for fetching raw worksheet
//! rows over the Sheets v4 REST API, authenticated with a service-account
//! key. Errors are classified into the [`SheetError`] taxonomy so the
//! refresh loop can tell retryable failures from configuration problems.

pub mod client;
pub mod error;

pub use client::{spreadsheet_id_from_url, SheetsClient};
pub use error::SheetError;
