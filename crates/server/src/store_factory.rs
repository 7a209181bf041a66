use std::sync::Arc;

use requeue_audit::{AuditStore, MemoryAuditStore};
use requeue_store::ReplayStore;
use requeue_store_memory::MemoryReplayStore;

use crate::config::StoreConfig;
use crate::error::ServerError;

/// The replay store together with the audit store living in the same backend.
pub struct Stores {
    pub replay: Arc<dyn ReplayStore>,
    pub audit: Arc<dyn AuditStore>,
}

/// Create the configured store backend.
///
/// The postgres backend runs its migrations on connect.
pub async fn create_stores(config: &StoreConfig) -> Result<Stores, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Stores {
            replay: Arc::new(MemoryReplayStore::new()),
            audit: Arc::new(MemoryAuditStore::new()),
        }),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.url.clone().ok_or_else(|| {
                ServerError::Config("store.url is required for the postgres backend".into())
            })?;
            let pg_config = requeue_store_postgres::PostgresConfig {
                url,
                pool_size: config.pool_size,
                schema: config.schema.clone(),
                table_prefix: config.table_prefix.clone(),
            };
            let store = requeue_store_postgres::PostgresReplayStore::new(pg_config)
                .await
                .map_err(|e| ServerError::Config(format!("postgres store: {e}")))?;
            Ok(Stores {
                replay: Arc::new(store.clone()),
                audit: Arc::new(store),
            })
        }
        #[cfg(not(feature = "postgres"))]
        "postgres" => Err(ServerError::Config(
            "postgres backend requires the `postgres` feature".into(),
        )),
        other => Err(ServerError::Config(format!("unknown store backend: {other}"))),
    }
}
