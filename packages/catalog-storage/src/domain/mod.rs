//! Catalog Domain Layer
//!
//! - `models`: datasets, columns, lineage edges and their identity types
//! - `ports`: the `CatalogRepository` trait every store adapter implements

pub mod models;
pub mod ports;

pub use models::{
    contains_ignore_case, normalize_component, Column, ColumnId, ColumnMatch, Dataset, DatasetId,
    EdgeId, Fqn, FqnParts, LineageEdge, LineageNode, NewColumn, NewDataset,
    ParseSourceSystemError, SearchField, SourceSystem, DEFAULT_DATA_TYPE,
};
pub use ports::CatalogRepository;
