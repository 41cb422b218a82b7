use tracing::Instrument;
use uuid::Uuid;

use crate::mirror::models::{MirrorOutcome, MirrorRecord, StagedRow, StagingBatch, TableSpec};
use crate::mirror::repositories::{MirrorSession, MirrorStore};
use crmsync_common::error::CrmResult;

/// Stage-upsert-prune synchronizer.
///
/// Each call treats the batch as the complete remote snapshot: afterwards the
/// target holds exactly the batch's keys. Runs against the same table must not
/// overlap since they share one staging table.
pub struct Synchronizer<S> {
    store: S,
    schema: String,
}

struct PhaseCounts {
    staged: u64,
    upserted: u64,
    pruned: u64,
}

impl<S: MirrorStore> Synchronizer<S> {
    pub fn new(store: S, schema: impl Into<String>) -> Self {
        Self {
            store,
            schema: schema.into(),
        }
    }

    /// Mirror `batch` into the record type's table.
    ///
    /// Schema setup runs first on its own; clearing, loading, upserting and
    /// pruning then run in one transaction that is rolled back on any failure.
    pub async fn synchronize<T>(&self, batch: &[T]) -> CrmResult<MirrorOutcome>
    where
        T: MirrorRecord + Sync,
    {
        let spec = TableSpec::for_record::<T>(&self.schema)?;
        let staging = StagingBatch::from_records(batch);
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "mirror_sync",
            %run_id,
            table = %spec.qualified_target()
        );

        self.run(spec, staging).instrument(span).await
    }

    async fn run(&self, spec: TableSpec, staging: StagingBatch) -> CrmResult<MirrorOutcome> {
        if staging.discarded() > 0 {
            tracing::warn!(
                discarded = staging.discarded(),
                "records without a natural key were dropped"
            );
        }
        if staging.is_empty() {
            tracing::warn!("batch is empty, every target row will be pruned");
        }

        self.store.ensure_tables(&spec).await?;

        let mut session = self.store.begin().await?;
        let counts = match reconcile(&mut session, &spec, staging.rows()).await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::error!(error = %e, "mirror sync failed, rolling back");
                if let Err(rollback_err) = session.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                return Err(e);
            }
        };
        session.commit().await?;

        let outcome = MirrorOutcome {
            table: spec.qualified_target(),
            staged: counts.staged,
            discarded: staging.discarded(),
            upserted: counts.upserted,
            pruned: counts.pruned,
        };

        tracing::info!(
            staged = outcome.staged,
            distinct_keys = staging.distinct_keys(),
            upserted = outcome.upserted,
            pruned = outcome.pruned,
            "mirror sync committed"
        );
        Ok(outcome)
    }
}

async fn reconcile<M: MirrorSession>(
    session: &mut M,
    spec: &TableSpec,
    rows: &[StagedRow],
) -> CrmResult<PhaseCounts> {
    session.clear_staging(spec).await?;

    let staged = session.bulk_load(spec, rows).await?;
    tracing::debug!(staged, "staging loaded");

    let upserted = session.upsert_from_staging(spec).await?;
    tracing::debug!(upserted, "target upserted");

    let pruned = session.prune_missing(spec).await?;
    tracing::debug!(pruned, "target pruned");

    // Leave staging empty for the next run.
    session.clear_staging(spec).await?;

    Ok(PhaseCounts {
        staged,
        upserted,
        pruned,
    })
}
