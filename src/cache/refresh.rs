//! Timer-driven refresh loop: fetch, parse, publish.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use chrono_tz::Tz;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::roster::parse;
use crate::sheets::SheetsClient;

use super::RosterCache;

/// Run one fetch+parse+publish cycle. Never returns an error: every
/// failure mode ends up in the cache as a `FetchFailed` snapshot.
pub async fn refresh_once(cache: &RosterCache, client: &SheetsClient, tab: &str, tz: Tz) {
    debug!(tab = tab, "Starting refresh cycle");

    match client.fetch_rows(tab).await {
        Ok(rows) => {
            // Short ДД.ММ dates assume the current year in the server timezone.
            let year = Utc::now().with_timezone(&tz).year();
            let (roster, warnings) = parse(&rows, year);
            cache.publish_success(roster, warnings);
        }
        Err(e) => {
            cache.publish_failure(e.to_string());
        }
    }
}

/// Drive [`refresh_once`] on a fixed interval until the process exits.
///
/// The first tick fires immediately, giving an initial fetch at startup.
/// A tick that lands while a slow fetch is still running is skipped, not
/// queued, so at most one refresh executes at a time.
pub async fn run(
    cache: Arc<RosterCache>,
    client: SheetsClient,
    tab: String,
    tz: Tz,
    interval: Duration,
) {
    info!(
        tab = %tab,
        interval_secs = interval.as_secs(),
        timezone = %tz,
        "Background refresh loop started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        refresh_once(&cache, &client, &tab, tz).await;
    }
}
