use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::roster::{ParseWarning, Roster};

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Success,
    PartialParseErrors,
    FetchFailed,
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStatus::Success => write!(f, "success"),
            FetchStatus::PartialParseErrors => write!(f, "partial_parse_errors"),
            FetchStatus::FetchFailed => write!(f, "fetch_failed"),
        }
    }
}

/// One published snapshot: the roster plus fetch metadata.
///
/// On `FetchFailed` the roster is the last successfully fetched one (empty
/// if no fetch has ever succeeded), so a failed cycle degrades freshness
/// but not availability.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub roster: Roster,
    /// When this refresh attempt ran (success or not).
    pub fetched_at: DateTime<Utc>,
    /// When the served roster was last fetched successfully. Carried
    /// unchanged across failed cycles; `None` until the first success.
    pub last_success_at: Option<DateTime<Utc>>,
    pub status: FetchStatus,
    pub error_detail: Option<String>,
    pub warnings: Vec<ParseWarning>,
}

impl FetchResult {
    /// Snapshot age in seconds, clamped at zero against clock skew.
    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_seconds().max(0)
    }
}

/// Process-wide roster cache: one writer (the refresh loop), many readers.
///
/// Snapshots are published as a whole through a watch channel, so readers
/// always observe a fully-formed [`FetchResult`] and never block on
/// network I/O. The channel holds `None` until the first refresh.
pub struct RosterCache {
    tx: watch::Sender<Option<Arc<FetchResult>>>,
    consecutive_failures: AtomicU32,
}

impl RosterCache {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// The last published snapshot. Never blocks; `None` before the first
    /// refresh completes.
    pub fn snapshot(&self) -> Option<Arc<FetchResult>> {
        self.tx.borrow().clone()
    }

    /// Failed cycles since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Publish a freshly parsed roster. Status is `PartialParseErrors`
    /// when any rows were skipped, `Success` otherwise.
    pub fn publish_success(&self, roster: Roster, warnings: Vec<ParseWarning>) {
        let status = if warnings.is_empty() {
            FetchStatus::Success
        } else {
            FetchStatus::PartialParseErrors
        };
        let error_detail = if warnings.is_empty() {
            None
        } else {
            Some(format!("{} rows skipped", warnings.len()))
        };

        self.consecutive_failures.store(0, Ordering::Relaxed);
        info!(
            entries = roster.len(),
            skipped = warnings.len(),
            status = %status,
            "Roster refreshed"
        );

        let now = Utc::now();
        self.tx.send_replace(Some(Arc::new(FetchResult {
            roster,
            fetched_at: now,
            last_success_at: Some(now),
            status,
            error_detail,
            warnings,
        })));
    }

    /// Publish a failed cycle. The previous roster is carried forward so
    /// readers keep getting last-known-good data while the failure stays
    /// observable through status and error detail.
    pub fn publish_failure(&self, error_detail: String) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let prior = self.snapshot();
        let prior_roster = prior.as_ref().map(|r| r.roster.clone()).unwrap_or_default();
        let last_success_at = prior.as_ref().and_then(|r| r.last_success_at);

        warn!(
            consecutive_failures = failures,
            error = %error_detail,
            carried_entries = prior_roster.len(),
            "Refresh failed, serving last-known-good roster"
        );

        self.tx.send_replace(Some(Arc::new(FetchResult {
            roster: prior_roster,
            fetched_at: Utc::now(),
            last_success_at,
            status: FetchStatus::FetchFailed,
            error_detail: Some(error_detail),
            warnings: Vec::new(),
        })));
    }
}

impl Default for RosterCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::DutyEntry;
    use chrono::NaiveDate;

    fn sample_roster() -> Roster {
        Roster::from_entries(vec![DutyEntry::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Иванов",
            None,
        )])
    }

    #[test]
    fn test_snapshot_empty_before_first_refresh() {
        let cache = RosterCache::new();
        assert!(cache.snapshot().is_none());
        assert_eq!(cache.consecutive_failures(), 0);
    }

    #[test]
    fn test_publish_success_clean() {
        let cache = RosterCache::new();
        cache.publish_success(sample_roster(), vec![]);

        let snap = cache.snapshot().unwrap();
        assert_eq!(snap.status, FetchStatus::Success);
        assert_eq!(snap.roster.len(), 1);
        assert!(snap.error_detail.is_none());
    }

    #[test]
    fn test_publish_success_with_warnings_is_partial() {
        let cache = RosterCache::new();
        let warnings = vec![ParseWarning {
            row: 3,
            reason: "unparseable date: \"bad\"".to_string(),
        }];
        cache.publish_success(sample_roster(), warnings);

        let snap = cache.snapshot().unwrap();
        assert_eq!(snap.status, FetchStatus::PartialParseErrors);
        assert_eq!(snap.error_detail.as_deref(), Some("1 rows skipped"));
        assert_eq!(snap.warnings.len(), 1);
    }

    #[test]
    fn test_failure_after_success_keeps_roster() {
        let cache = RosterCache::new();
        cache.publish_success(sample_roster(), vec![]);
        cache.publish_failure("network timeout after 3 attempts".to_string());

        let snap = cache.snapshot().unwrap();
        assert_eq!(snap.status, FetchStatus::FetchFailed);
        assert_eq!(snap.roster, sample_roster());
        assert!(snap.error_detail.is_some());
        assert_eq!(cache.consecutive_failures(), 1);
    }

    #[test]
    fn test_failure_without_prior_success_serves_empty_roster() {
        let cache = RosterCache::new();
        cache.publish_failure("auth failed".to_string());

        let snap = cache.snapshot().unwrap();
        assert_eq!(snap.status, FetchStatus::FetchFailed);
        assert!(snap.roster.is_empty());
    }

    #[test]
    fn test_success_resets_failure_counter() {
        let cache = RosterCache::new();
        cache.publish_failure("boom".to_string());
        cache.publish_failure("boom".to_string());
        assert_eq!(cache.consecutive_failures(), 2);

        cache.publish_success(sample_roster(), vec![]);
        assert_eq!(cache.consecutive_failures(), 0);
    }

    #[test]
    fn test_failure_preserves_last_success_time() {
        let cache = RosterCache::new();
        cache.publish_success(sample_roster(), vec![]);
        let success_at = cache.snapshot().unwrap().fetched_at;

        cache.publish_failure("boom".to_string());
        cache.publish_failure("boom".to_string());

        let snap = cache.snapshot().unwrap();
        // The attempt time advances, the success time does not.
        assert_eq!(snap.last_success_at, Some(success_at));
        assert!(snap.fetched_at >= success_at);
    }

    #[test]
    fn test_failure_without_prior_success_has_no_success_time() {
        let cache = RosterCache::new();
        cache.publish_failure("boom".to_string());

        let snap = cache.snapshot().unwrap();
        assert!(snap.last_success_at.is_none());
    }

    #[test]
    fn test_snapshot_idempotent_between_refreshes() {
        let cache = RosterCache::new();
        cache.publish_success(sample_roster(), vec![]);

        let a = cache.snapshot().unwrap();
        let b = cache.snapshot().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
