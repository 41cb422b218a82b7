pub mod crm;
pub mod mirror;

use std::time::Duration;

use crmsync_common::error::{CrmError, CrmResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a Postgres connection pool from a database URL.
///
/// Connection failures surface as [`CrmError::StorageUnavailable`].
pub async fn create_pool(database_url: &str, max_connections: u32) -> CrmResult<PgPool> {
    tracing::info!(max_connections, "connecting to database");
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(|e| CrmError::StorageUnavailable(e.to_string()))
}
