#![allow(dead_code)]

use std::sync::Arc;

use catalog_service::{Catalog, CreateDataset, EdgeRequest};
use catalog_storage::{CatalogRepository, InMemoryCatalogStore, SourceSystem, SqliteCatalogStore};

/// One catalog per store adapter, labelled for assertion messages
pub fn catalogs() -> Vec<(&'static str, Catalog)> {
    let memory: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalogStore::new());
    let sqlite: Arc<dyn CatalogRepository> = Arc::new(SqliteCatalogStore::in_memory().unwrap());
    vec![("memory", Catalog::new(memory)), ("sqlite", Catalog::new(sqlite))]
}

/// `s.d.x.<table>`
pub fn fqn(table: &str) -> String {
    format!("s.d.x.{}", table)
}

pub fn edge(up: &str, down: &str) -> EdgeRequest {
    EdgeRequest::new(fqn(up), fqn(down))
}

pub async fn create_tables(catalog: &Catalog, tables: &[&str]) {
    for table in tables {
        catalog
            .datasets
            .create(CreateDataset::new("s", "d", "x", *table).source_system(SourceSystem::PostgreSql))
            .await
            .unwrap();
    }
}
