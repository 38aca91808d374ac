//! In-memory roster cache with timer-driven refresh.
//!
//! The cache holds the most recently parsed roster plus fetch metadata
//! and serves stale-but-available data when a refresh fails. A single
//! background task writes; HTTP handlers only read published snapshots.

pub mod refresh;
pub mod store;

pub use store::{FetchResult, FetchStatus, RosterCache};
