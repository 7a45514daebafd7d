//! Catalog Storage - the record store behind the metadata catalog
//!
//! Durable storage of datasets, their columns and the lineage edges between
//! them. Business rules (FQN uniqueness checks, cycle prevention, search
//! ranking) live in `catalog-service`; this crate only persists records and
//! enforces referential integrity.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_storage::{
//!     CatalogRepository, FqnParts, NewColumn, NewDataset, SourceSystem, SqliteCatalogStore,
//! };
//!
//! let store = SqliteCatalogStore::open("metadata.db")?;
//! let orders = store.create_dataset(&NewDataset {
//!     parts: FqnParts::new("sf", "bi", "bronze", "orders_raw"),
//!     source_system: SourceSystem::Snowflake,
//!     description: None,
//!     columns: vec![NewColumn::new("order_id", "INT")],
//! }).await?;
//!
//! // Cascades to columns and every edge touching the dataset
//! store.delete_dataset(orders.id).await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    CatalogRepository, Column, ColumnId, ColumnMatch, Dataset, DatasetId, EdgeId, Fqn, FqnParts,
    LineageEdge, LineageNode, NewColumn, NewDataset, SearchField, SourceSystem,
};

pub use infrastructure::InMemoryCatalogStore;

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteCatalogStore;
