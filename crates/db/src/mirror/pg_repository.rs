use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::mirror::copy::encode_rows;
use crate::mirror::models::{StagedRow, TableSpec};
use crate::mirror::repositories::{MirrorSession, MirrorStore};
use crate::mirror::sql;
use crmsync_common::error::{CrmError, CrmResult, SyncPhase};

/// `COPY` payloads are streamed to the server in chunks of this size.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct PgMirrorStore {
    pool: PgPool,
}

impl PgMirrorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MirrorStore for PgMirrorStore {
    type Session = PgMirrorSession;

    async fn ensure_tables(&self, spec: &TableSpec) -> CrmResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| CrmError::StorageUnavailable(e.to_string()))?;

        for statement in [
            sql::create_schema(spec),
            sql::create_target(spec),
            sql::create_staging(spec),
        ] {
            sqlx::query(&statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| CrmError::phase(SyncPhase::EnsureSchema, e))?;
        }

        tracing::debug!(table = %spec.qualified_target(), "mirror tables verified");
        Ok(())
    }

    async fn begin(&self) -> CrmResult<PgMirrorSession> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CrmError::StorageUnavailable(e.to_string()))?;
        Ok(PgMirrorSession { tx })
    }
}

pub struct PgMirrorSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MirrorSession for PgMirrorSession {
    async fn clear_staging(&mut self, spec: &TableSpec) -> CrmResult<()> {
        sqlx::query(&sql::clear_staging(spec))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| CrmError::phase(SyncPhase::ClearStaging, e))?;
        Ok(())
    }

    async fn bulk_load(&mut self, spec: &TableSpec, rows: &[StagedRow]) -> CrmResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let payload = encode_rows(rows);
        let statement = sql::copy_into_staging(spec);

        let mut copy = self
            .tx
            .copy_in_raw(&statement)
            .await
            .map_err(|e| CrmError::phase(SyncPhase::BulkLoad, e))?;

        for chunk in payload.chunks(COPY_CHUNK_BYTES) {
            copy.send(chunk)
                .await
                .map_err(|e| CrmError::phase(SyncPhase::BulkLoad, e))?;
        }

        let loaded = copy
            .finish()
            .await
            .map_err(|e| CrmError::phase(SyncPhase::BulkLoad, e))?;

        tracing::debug!(
            table = %spec.qualified_staging(),
            rows = loaded,
            bytes = payload.len(),
            "staging loaded"
        );
        Ok(loaded)
    }

    async fn upsert_from_staging(&mut self, spec: &TableSpec) -> CrmResult<u64> {
        let result = sqlx::query(&sql::upsert_from_staging(spec))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| CrmError::phase(SyncPhase::Upsert, e))?;
        Ok(result.rows_affected())
    }

    async fn prune_missing(&mut self, spec: &TableSpec) -> CrmResult<u64> {
        let result = sqlx::query(&sql::prune_missing(spec))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| CrmError::phase(SyncPhase::Prune, e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> CrmResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| CrmError::phase(SyncPhase::Commit, e))
    }

    async fn rollback(self) -> CrmResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| CrmError::StorageUnavailable(e.to_string()))
    }
}
