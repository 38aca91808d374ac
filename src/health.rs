//! Freshness and availability reporting for the deployment health check.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{FetchStatus, RosterCache};

/// What `GET /health` returns.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    /// When the last refresh attempt ran, success or failure.
    pub last_fetch_at: Option<DateTime<Utc>>,
    /// When the served roster was last fetched successfully.
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_status: Option<FetchStatus>,
}

/// Decides healthy/unhealthy from cache metadata only.
///
/// Healthy means: a snapshot exists, it is no older than
/// `refresh_interval * tolerance_factor`, and at most one refresh in a
/// row has failed. A single transient failure keeps the service healthy
/// while the last-known-good roster is still being served; repeated
/// failures or a stuck refresh loop flip it to unhealthy.
#[derive(Clone)]
pub struct HealthReporter {
    cache: Arc<RosterCache>,
    refresh_interval: Duration,
    tolerance_factor: u32,
}

impl HealthReporter {
    pub fn new(cache: Arc<RosterCache>, refresh_interval: Duration, tolerance_factor: u32) -> Self {
        Self {
            cache,
            refresh_interval,
            tolerance_factor,
        }
    }

    pub fn report(&self) -> HealthReport {
        let Some(snap) = self.cache.snapshot() else {
            return HealthReport {
                ok: false,
                last_fetch_at: None,
                last_success_at: None,
                last_status: None,
            };
        };

        let max_age_secs =
            self.refresh_interval.as_secs() as i64 * i64::from(self.tolerance_factor);
        let fresh = snap.age_seconds() <= max_age_secs;
        let failing = self.cache.consecutive_failures() > 1;

        HealthReport {
            ok: fresh && !failing,
            last_fetch_at: Some(snap.fetched_at),
            last_success_at: snap.last_success_at,
            last_status: Some(snap.status),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{DutyEntry, Roster};
    use chrono::NaiveDate;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn sample_roster() -> Roster {
        Roster::from_entries(vec![DutyEntry::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Иванов",
            None,
        )])
    }

    #[test]
    fn test_unhealthy_before_first_fetch() {
        let reporter = HealthReporter::new(Arc::new(RosterCache::new()), INTERVAL, 3);
        let report = reporter.report();
        assert!(!report.ok);
        assert!(report.last_fetch_at.is_none());
        assert!(report.last_success_at.is_none());
        assert!(report.last_status.is_none());
    }

    #[test]
    fn test_healthy_after_successful_refresh() {
        let cache = Arc::new(RosterCache::new());
        cache.publish_success(sample_roster(), vec![]);

        let report = HealthReporter::new(cache, INTERVAL, 3).report();
        assert!(report.ok);
        assert_eq!(report.last_status, Some(FetchStatus::Success));
    }

    #[test]
    fn test_single_failure_tolerated() {
        let cache = Arc::new(RosterCache::new());
        cache.publish_success(sample_roster(), vec![]);
        cache.publish_failure("timeout".to_string());

        let report = HealthReporter::new(cache, INTERVAL, 3).report();
        assert!(report.ok);
        assert_eq!(report.last_status, Some(FetchStatus::FetchFailed));
        // The report still says when the served roster was fetched.
        assert!(report.last_success_at.is_some());
        assert!(report.last_success_at <= report.last_fetch_at);
    }

    #[test]
    fn test_two_consecutive_failures_unhealthy() {
        let cache = Arc::new(RosterCache::new());
        cache.publish_success(sample_roster(), vec![]);
        cache.publish_failure("timeout".to_string());
        cache.publish_failure("timeout".to_string());

        let report = HealthReporter::new(cache, INTERVAL, 1).report();
        assert!(!report.ok);
    }

    #[test]
    fn test_recovery_restores_health() {
        let cache = Arc::new(RosterCache::new());
        cache.publish_failure("timeout".to_string());
        cache.publish_failure("timeout".to_string());
        cache.publish_success(sample_roster(), vec![]);

        let report = HealthReporter::new(cache, INTERVAL, 1).report();
        assert!(report.ok);
    }
}
