//! Startup orchestration.
//!
//! Config is loaded and validated by the caller; this module brings up the
//! store and applies the storage availability policy:
//! - the service starts even if the backend does not answer, logging the
//!   failure; requests needing storage get 500 until it recovers
//! - with `storage.require_on_startup`, an unanswered ping is fatal
//! - backend setup (the `collected_at` index) runs once the ping succeeds;
//!   when it cannot, the readiness probe retries it until it does

use std::sync::Arc;
use std::time::Duration;

use crate::config::{StorageBackend, StorageConfig};
use crate::resilience::with_deadline;
use crate::storage::{IngestionStore, MemoryStore, MongoStore, StoreResult};

/// Build the configured store and probe it once.
pub async fn init_store(config: &StorageConfig) -> StoreResult<Arc<dyn IngestionStore>> {
    let deadline = Duration::from_millis(config.timeout_ms);

    let store: Arc<dyn IngestionStore> = match config.backend {
        StorageBackend::Mongo => Arc::new(MongoStore::connect(config).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    match with_deadline(deadline, store.ping()).await {
        Ok(()) => {
            tracing::info!(backend = store.backend_name(), "Storage reachable");
            if let Err(e) = with_deadline(deadline, store.prepare()).await {
                tracing::warn!(backend = store.backend_name(), error = %e, "Storage setup deferred");
            }
        }
        Err(e) if config.require_on_startup => {
            tracing::error!(backend = store.backend_name(), error = %e, "Storage unreachable at startup");
            return Err(e);
        }
        Err(e) => {
            tracing::warn!(
                backend = store.backend_name(),
                error = %e,
                "Storage unreachable at startup; accepting requests anyway"
            );
        }
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_starts() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            require_on_startup: true,
            ..StorageConfig::default()
        };
        let store = init_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
