//! Store selection from configuration

use std::sync::Arc;
use tracing::info;

use catalog_storage::{CatalogRepository, InMemoryCatalogStore, SqliteCatalogStore};

use crate::config::DatabaseTarget;
use crate::error::Result;

/// Open the repository `target` points at
///
/// SQLite files are created with the schema on first open.
pub fn open_repository(target: &DatabaseTarget) -> Result<Arc<dyn CatalogRepository>> {
    let repo: Arc<dyn CatalogRepository> = match target {
        DatabaseTarget::SqliteFile(path) => {
            info!(path = %path.display(), "Opening SQLite catalog");
            Arc::new(SqliteCatalogStore::open(path)?)
        }
        DatabaseTarget::SqliteInMemory => {
            info!("Opening in-memory SQLite catalog");
            Arc::new(SqliteCatalogStore::in_memory()?)
        }
        DatabaseTarget::Memory => {
            info!("Using in-memory catalog arena");
            Arc::new(InMemoryCatalogStore::new())
        }
    };
    Ok(repo)
}
