use async_trait::async_trait;

use crate::mirror::models::{StagedRow, TableSpec};
use crmsync_common::error::CrmResult;

/// Storage capability behind the mirror synchronizer.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    type Session: MirrorSession;

    /// Create the namespace, target and staging tables when absent.
    /// Never alters existing tables.
    async fn ensure_tables(&self, spec: &TableSpec) -> CrmResult<()>;

    /// Open a transactional session. Fails with `StorageUnavailable` when no
    /// connection can be acquired.
    async fn begin(&self) -> CrmResult<Self::Session>;
}

/// One transaction over a target/staging pair. Dropping a session without
/// calling `commit` discards its work.
#[async_trait]
pub trait MirrorSession: Send {
    async fn clear_staging(&mut self, spec: &TableSpec) -> CrmResult<()>;

    /// Stream rows into staging, returning the number of rows loaded.
    async fn bulk_load(&mut self, spec: &TableSpec, rows: &[StagedRow]) -> CrmResult<u64>;

    /// Insert or overwrite one target row per staged key, returning the
    /// number of target rows written.
    async fn upsert_from_staging(&mut self, spec: &TableSpec) -> CrmResult<u64>;

    /// Delete target rows whose key is not staged, returning the count.
    async fn prune_missing(&mut self, spec: &TableSpec) -> CrmResult<u64>;

    async fn commit(self) -> CrmResult<()>;

    async fn rollback(self) -> CrmResult<()>;
}
