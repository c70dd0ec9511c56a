pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sqlite;
pub mod traits;

use crate::{config::Config, error::StorageError};
use std::sync::Arc;

pub use memory::MemoryAccountStorage;
#[cfg(feature = "postgres")]
pub use postgres::PostgresAccountStorage;
pub use sqlite::SqliteAccountStorage;
pub use traits::{AccountStorage, StorageResult};

/// Picks the account storage backend from configuration.
pub struct AccountStorageManager {
    backend: Arc<dyn AccountStorage>,
}

impl AccountStorageManager {
    pub async fn new(config: &Config) -> StorageResult<Self> {
        let backend: Arc<dyn AccountStorage> = if config.use_psql {
            #[cfg(feature = "postgres")]
            {
                let postgres_config = config.postgres.clone().ok_or_else(|| {
                    StorageError::Backend("PostgreSQL config required".into())
                })?;
                Arc::new(PostgresAccountStorage::new(postgres_config).await?)
            }
            #[cfg(not(feature = "postgres"))]
            {
                return Err(StorageError::Backend(
                    "PostgreSQL feature not enabled".into(),
                ));
            }
        } else {
            Arc::new(SqliteAccountStorage::open(&config.database_path)?)
        };

        Ok(Self { backend })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryAccountStorage::new()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn AccountStorage> {
        &self.backend
    }
}
