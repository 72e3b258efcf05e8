//! Object cache port trait.

use std::time::Duration;

use crate::record::Record;

/// Key-value store for scalar entity snapshots with per-entry expiry.
///
/// Entries past their time-to-live read as absent. Concurrent writers to the
/// same key race; the last write wins.
#[async_trait::async_trait]
pub trait ObjectCache: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Option<Record>;

    async fn set(&self, key: &str, snapshot: Record, ttl: Duration);

    async fn remove(&self, key: &str);
}
