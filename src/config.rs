//! Application configuration management.
//!
//! All configuration is environment-sourced (a `.env` file is honored via
//! dotenvy in `main`). `GOOGLE_SHEET_URL` is the only required variable;
//! everything else has a sensible default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;

/// The worksheet tab holding the evening duty schedule.
pub const EVENING_DUTY_TAB: &str = "Вечернее дежурство";

/// Default seconds between refresh cycles. One minute keeps the board
/// fresh without hammering the Sheets API.
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Default missed-cycle tolerance before `/health` reports unhealthy.
const DEFAULT_TOLERANCE_FACTOR: u32 = 3;

/// Default server timezone for calendar-day decisions.
const DEFAULT_TIMEZONE: &str = "Asia/Yekaterinburg";

const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Full Google Sheets URL of the duty spreadsheet.
    pub sheet_url: String,
    /// Path to the service-account JSON key.
    pub credentials_file: PathBuf,
    /// Time between refresh cycles; controls the staleness ceiling.
    pub refresh_interval: Duration,
    /// Multiplier on the refresh interval before staleness is unhealthy.
    pub tolerance_factor: u32,
    /// Server timezone - "today" is decided in this zone.
    pub timezone: Tz,
    /// Address the HTTP server binds to.
    pub listen_addr: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let sheet_url = match std::env::var("GOOGLE_SHEET_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => bail!("GOOGLE_SHEET_URL is not set"),
        };

        let credentials_file = std::env::var("GOOGLE_CREDENTIALS_FILE")
            .unwrap_or_else(|_| DEFAULT_CREDENTIALS_FILE.to_string())
            .into();

        let refresh_interval = match std::env::var("REFRESH_INTERVAL_SECS") {
            Ok(raw) => Duration::from_secs(parse_positive(&raw).context("REFRESH_INTERVAL_SECS")?),
            Err(_) => Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        };

        let tolerance_factor = match std::env::var("HEALTH_TOLERANCE_FACTOR") {
            Ok(raw) => parse_tolerance(&raw).context("HEALTH_TOLERANCE_FACTOR")?,
            Err(_) => DEFAULT_TOLERANCE_FACTOR,
        };

        let timezone = std::env::var("SERVER_TIMEZONE")
            .unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let timezone = parse_timezone(&timezone)?;

        let listen_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());

        Ok(Self {
            sheet_url,
            credentials_file,
            refresh_interval,
            tolerance_factor,
            timezone,
            listen_addr,
        })
    }
}

fn parse_positive(raw: &str) -> Result<u64> {
    let value: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("not a number: {:?}", raw))?;
    if value == 0 {
        bail!("must be greater than zero");
    }
    Ok(value)
}

fn parse_tolerance(raw: &str) -> Result<u32> {
    let value = parse_positive(raw)?;
    u32::try_from(value).with_context(|| format!("value out of range: {:?}", raw))
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown timezone: {:?}", name))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("60").unwrap(), 60);
        assert_eq!(parse_positive(" 120 ").unwrap(), 120);
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("sixty").is_err());
        assert!(parse_positive("-5").is_err());
    }

    #[test]
    fn test_parse_tolerance_rejects_out_of_range_values() {
        assert_eq!(parse_tolerance("3").unwrap(), 3);
        assert!(parse_tolerance("0").is_err());
        // Larger than u32 must error rather than wrap.
        assert!(parse_tolerance("4294967296").is_err());
        assert!(parse_tolerance("5000000000").is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(
            parse_timezone("Asia/Yekaterinburg").unwrap(),
            chrono_tz::Asia::Yekaterinburg
        );
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
