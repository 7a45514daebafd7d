//! Catalog Service - lineage-aware metadata catalog
//!
//! Datasets, their columns and the lineage DAG between them, on top of any
//! `catalog_storage::CatalogRepository`.
//!
//! - `lineage::graph`: cycle check and neighbor index, pure functions
//! - `lineage::service`: edge add/remove gated by the cycle check
//! - `search`: four-tier substring search with de-duplicated ranking
//! - `dataset`: FQN-unique dataset lifecycle
//! - `config`, `http`, `store`: process configuration and the axum boundary
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_service::{Catalog, CreateDataset, EdgeRequest};
//! use catalog_storage::InMemoryCatalogStore;
//!
//! let catalog = Catalog::new(Arc::new(InMemoryCatalogStore::new()));
//! catalog.datasets.create(CreateDataset::new("sf", "bi", "bronze", "raw")).await?;
//! catalog.datasets.create(CreateDataset::new("sf", "bi", "silver", "clean")).await?;
//! catalog.lineage.add_edge(&EdgeRequest::new("sf.bi.bronze.raw", "sf.bi.silver.clean")).await?;
//!
//! // Rejected: would close raw → clean → raw
//! assert!(catalog.lineage.add_edge(&EdgeRequest::new("sf.bi.silver.clean", "sf.bi.bronze.raw")).await.is_err());
//! ```

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod http;
pub mod lineage;
pub mod search;
pub mod store;
pub mod validation;

pub use catalog::Catalog;
pub use config::{CatalogConfig, ConfigError, DatabaseTarget, Validatable};
pub use dataset::{CreateDataset, DatasetService, UpdateDataset};
pub use error::{CatalogError, ErrorKind, Result};
pub use lineage::{
    build_adjacency, would_create_cycle, DatasetLineage, EdgeRequest, LineageEdgeView,
    LineageService, NeighborIndex,
};
pub use search::{MatchType, SearchResponse, SearchResult, SearchService};
pub use store::open_repository;
