use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;

use crmsync_common::error::CrmResult;
use crmsync_db::mirror::{MirrorStore, Synchronizer};

use super::entities::HubSpotEntity;
use crate::connector::{Connector, SyncResult};
use crate::fetcher::{Fetcher, FetcherSettings, RecordSource};

/// Fetches one entity kind in full and mirrors it into its table.
pub struct EntitySyncer<E, S, M> {
    source: S,
    synchronizer: Synchronizer<M>,
    settings: FetcherSettings,
    max_records: Option<usize>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S, M> EntitySyncer<E, S, M>
where
    E: HubSpotEntity,
    S: RecordSource,
    M: MirrorStore,
{
    pub fn new(
        source: S,
        synchronizer: Synchronizer<M>,
        settings: FetcherSettings,
        max_records: Option<usize>,
    ) -> Self {
        Self {
            source,
            synchronizer,
            settings,
            max_records,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, S, M> Connector for EntitySyncer<E, S, M>
where
    E: HubSpotEntity,
    S: RecordSource,
    M: MirrorStore,
{
    fn source_name(&self) -> &str {
        E::NAME
    }

    async fn sync(&self) -> CrmResult<SyncResult> {
        let started = Instant::now();

        let fetcher = Fetcher::new(&self.source, self.settings);
        let objects = fetcher.fetch(&E::plan(), self.max_records).await;
        tracing::info!(entity = E::NAME, fetched = objects.len(), "fetched hubspot objects");

        let records: Vec<E> = objects.iter().map(E::from_object).collect();
        if let Some(first) = records.first() {
            match serde_json::to_string(first) {
                Ok(json) => tracing::debug!(entity = E::NAME, record = %json, "first record"),
                Err(e) => tracing::debug!(entity = E::NAME, error = %e, "first record not serializable"),
            }
        }

        let outcome = self.synchronizer.synchronize(&records).await?;

        let result = SyncResult {
            source: E::NAME.to_string(),
            fetched: objects.len(),
            discarded: outcome.discarded,
            staged: outcome.staged,
            upserted: outcome.upserted,
            pruned: outcome.pruned,
            elapsed_ms: started.elapsed().as_millis(),
        };

        tracing::info!(
            entity = E::NAME,
            elapsed_ms = result.elapsed_ms as u64,
            rows_affected = outcome.rows_affected(),
            "entity sync completed"
        );
        Ok(result)
    }
}
