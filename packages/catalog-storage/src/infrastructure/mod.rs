//! Infrastructure layer - Storage adapters

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryCatalogStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCatalogStore;
