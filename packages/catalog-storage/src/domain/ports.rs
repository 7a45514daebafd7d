//! Catalog Repository Port (Trait Interface)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Development/Production: SQLite
//! - Testing: InMemory (fast unit tests)

use async_trait::async_trait;

use super::models::{
    ColumnMatch, Dataset, DatasetId, LineageEdge, NewColumn, NewDataset, SearchField,
    SourceSystem,
};
use crate::Result;

/// Catalog Repository Port (Primary Interface)
///
/// Every call is atomic: multi-record writes (dataset + columns, cascade
/// delete, metadata + column replacement) either fully commit or leave the
/// store untouched. The store performs no business validation beyond its own
/// uniqueness constraints, which surface as `ErrorKind::Constraint`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Datasets
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Get dataset (with columns) by FQN
    async fn get_dataset_by_fqn(&self, fqn: &str) -> Result<Option<Dataset>>;

    /// Get dataset (with columns) by surrogate id
    async fn get_dataset(&self, id: DatasetId) -> Result<Option<Dataset>>;

    /// Get several datasets at once; missing ids are skipped
    ///
    /// Returned in FQN order.
    async fn get_datasets_by_ids(&self, ids: &[DatasetId]) -> Result<Vec<Dataset>>;

    /// Page through all datasets ordered by FQN
    async fn list_datasets(&self, offset: usize, limit: usize) -> Result<Vec<Dataset>>;

    /// Total number of datasets
    async fn count_datasets(&self) -> Result<usize>;

    /// Insert a dataset together with its initial columns
    ///
    /// Columns are stored as given; canonicalization is the caller's job.
    async fn create_dataset(&self, dataset: &NewDataset) -> Result<Dataset>;

    /// Update scalar metadata and optionally replace every column, as one unit
    ///
    /// `None` leaves a field (or the column list) unchanged. `Some(columns)`
    /// deletes the existing columns and inserts `columns` fresh. Always
    /// refreshes `updated_at`. On any failure nothing is written.
    async fn update_dataset(
        &self,
        dataset_id: DatasetId,
        source_system: Option<SourceSystem>,
        description: Option<&str>,
        columns: Option<&[NewColumn]>,
    ) -> Result<()>;

    /// Delete the dataset, its columns and every edge touching it
    async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<()>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Lineage Edges
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Exact ordered-pair lookup
    async fn get_edge(
        &self,
        upstream_id: DatasetId,
        downstream_id: DatasetId,
    ) -> Result<Option<LineageEdge>>;

    /// Full edge set, ordered by edge id
    async fn list_all_edges(&self) -> Result<Vec<LineageEdge>>;

    /// Edges with `dataset_id` on either side
    async fn list_edges_for_dataset(&self, dataset_id: DatasetId) -> Result<Vec<LineageEdge>>;

    /// Insert an edge; self-loops and duplicates are constraint violations
    async fn create_edge(
        &self,
        upstream_id: DatasetId,
        downstream_id: DatasetId,
    ) -> Result<LineageEdge>;

    /// Delete the edge with this exact ordered pair (no-op if absent)
    async fn delete_edge(&self, upstream_id: DatasetId, downstream_id: DatasetId) -> Result<()>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Search
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Columns whose name contains `substring`
    ///
    /// Matching is literal and case-insensitive over full Unicode.
    /// Ordered by column id so "first matching column" is deterministic.
    async fn list_columns_matching(&self, substring: &str) -> Result<Vec<ColumnMatch>>;

    /// Datasets whose `field` component contains `substring` (case-insensitive)
    async fn list_datasets_matching(
        &self,
        field: SearchField,
        substring: &str,
    ) -> Result<Vec<Dataset>>;
}
