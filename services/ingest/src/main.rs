mod connector;
mod fetcher;
mod hubspot;

use std::time::{Duration, Instant};

use crmsync_config::{init_tracing, AppConfig, SyncEntity};
use crmsync_db::crm::{Contact, Deal, Engagement, Lead};
use crmsync_db::mirror::{PgMirrorStore, Synchronizer};

use crate::connector::{Connector, RunSummary};
use crate::fetcher::FetcherSettings;
use crate::hubspot::client::{HubSpotClient, HubSpotClientConfig};
use crate::hubspot::sync::EntitySyncer;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    init_tracing(&config.log_level);

    tracing::info!(
        service = "crmsync-ingest",
        schema = %config.db_schema,
        entities = ?config.entities,
        fetch_mode = ?config.fetch_mode,
        "starting"
    );

    let pool = crmsync_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("failed to connect to database");
    let store = PgMirrorStore::new(pool);

    let client = HubSpotClient::new(HubSpotClientConfig::from_app_config(&config))
        .expect("failed to create hubspot client");

    let started = Instant::now();
    let mut summary = RunSummary::default();

    for &entity in &config.entities {
        let connector = build_connector(entity, &client, &store, &config);
        tracing::info!(entity = connector.source_name(), "starting entity sync");

        match connector.sync().await {
            Ok(result) => {
                tracing::info!(
                    source = %result.source,
                    fetched = result.fetched,
                    discarded = result.discarded,
                    staged = result.staged,
                    upserted = result.upserted,
                    pruned = result.pruned,
                    "entity mirrored"
                );
                summary.record(&result);
            }
            Err(e) => {
                tracing::error!(entity = %entity, error = %e, "entity sync failed");
                summary.record_failure(entity.as_str());
            }
        }
    }

    tracing::info!(
        fetched = summary.fetched,
        discarded = summary.discarded,
        staged = summary.staged,
        upserted = summary.upserted,
        pruned = summary.pruned,
        failed = ?summary.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ingest run finished"
    );

    if !summary.succeeded() {
        std::process::exit(1);
    }
}

fn build_connector(
    entity: SyncEntity,
    client: &HubSpotClient,
    store: &PgMirrorStore,
    config: &AppConfig,
) -> Box<dyn Connector> {
    let settings = FetcherSettings {
        page_size: config.page_size,
        page_delay: Duration::from_millis(config.page_delay_ms),
        mode: config.fetch_mode,
    };
    let synchronizer = Synchronizer::new(store.clone(), config.db_schema.clone());
    let source = client.clone();
    let max = config.max_records;

    match entity {
        SyncEntity::Contacts => Box::new(EntitySyncer::<Contact, _, _>::new(
            source,
            synchronizer,
            settings,
            max,
        )),
        SyncEntity::Deals => Box::new(EntitySyncer::<Deal, _, _>::new(
            source,
            synchronizer,
            settings,
            max,
        )),
        SyncEntity::Leads => Box::new(EntitySyncer::<Lead, _, _>::new(
            source,
            synchronizer,
            settings,
            max,
        )),
        SyncEntity::Engagements => Box::new(EntitySyncer::<Engagement, _, _>::new(
            source,
            synchronizer,
            settings,
            max,
        )),
    }
}
