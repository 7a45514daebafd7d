//! Dataset Orchestrator
//!
//! Owns the create/update/delete lifecycle of a dataset and its columns.
//! FQN uniqueness is checked here before the store is asked to insert.

use std::sync::Arc;
use tracing::info;

use catalog_storage::{CatalogRepository, Dataset};

use super::request::{canonical_columns, CreateDataset, UpdateDataset};
use crate::error::{CatalogError, Result};

#[derive(Clone)]
pub struct DatasetService {
    repo: Arc<dyn CatalogRepository>,
}

impl DatasetService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Register a dataset with its initial columns
    ///
    /// Fails with `Conflict` if the normalized FQN is already taken.
    pub async fn create(&self, request: CreateDataset) -> Result<Dataset> {
        let new = request.into_new_dataset()?;
        let fqn = new.fqn();

        if self.repo.get_dataset_by_fqn(fqn.as_str()).await?.is_some() {
            return Err(already_exists(fqn.as_str()));
        }

        let dataset = self.repo.create_dataset(&new).await.map_err(|e| {
            // Lost a race with a concurrent create of the same FQN
            if e.is_constraint() {
                already_exists(fqn.as_str())
            } else {
                e.into()
            }
        })?;

        info!(fqn = %dataset.fqn, columns = dataset.columns.len(), "Created dataset");
        Ok(dataset)
    }

    pub async fn get(&self, fqn: &str) -> Result<Dataset> {
        self.repo
            .get_dataset_by_fqn(fqn)
            .await?
            .ok_or_else(|| CatalogError::dataset_not_found(fqn))
    }

    /// One page of datasets ordered by FQN
    pub async fn list(&self, skip: usize, limit: usize) -> Result<Vec<Dataset>> {
        Ok(self.repo.list_datasets(skip, limit).await?)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.repo.count_datasets().await?)
    }

    /// Change scalar metadata and optionally replace every column
    ///
    /// One repository write: either all of it lands or none of it does.
    pub async fn update(&self, fqn: &str, request: UpdateDataset) -> Result<Dataset> {
        request.validate()?;
        let dataset = self.get(fqn).await?;

        let columns = request
            .columns
            .as_deref()
            .map(|columns| canonical_columns(columns, &dataset.fqn))
            .transpose()?;

        self.repo
            .update_dataset(
                dataset.id,
                request.source_system,
                request.description.as_deref(),
                columns.as_deref(),
            )
            .await?;

        info!(
            fqn = %dataset.fqn,
            replaced_columns = columns.is_some(),
            "Updated dataset"
        );
        self.get(fqn).await
    }

    /// Delete the dataset together with its columns and every edge it is on
    pub async fn delete(&self, fqn: &str) -> Result<()> {
        let dataset = self.get(fqn).await?;
        self.repo.delete_dataset(dataset.id).await?;
        info!(fqn = %dataset.fqn, "Deleted dataset");
        Ok(())
    }
}

fn already_exists(fqn: &str) -> CatalogError {
    CatalogError::conflict(format!("Dataset '{}' already exists.", fqn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use catalog_storage::{
        ColumnMatch, DatasetId, InMemoryCatalogStore, LineageEdge, NewColumn, NewDataset,
        SearchField, SourceSystem, StorageError,
    };
    use pretty_assertions::assert_eq;

    /// Delegates to the in-memory arena but fails every write that touches columns
    struct BrokenColumnWrites {
        inner: InMemoryCatalogStore,
    }

    #[async_trait]
    impl CatalogRepository for BrokenColumnWrites {
        async fn get_dataset_by_fqn(&self, fqn: &str) -> catalog_storage::Result<Option<Dataset>> {
            self.inner.get_dataset_by_fqn(fqn).await
        }

        async fn get_dataset(&self, id: DatasetId) -> catalog_storage::Result<Option<Dataset>> {
            self.inner.get_dataset(id).await
        }

        async fn get_datasets_by_ids(
            &self,
            ids: &[DatasetId],
        ) -> catalog_storage::Result<Vec<Dataset>> {
            self.inner.get_datasets_by_ids(ids).await
        }

        async fn list_datasets(
            &self,
            offset: usize,
            limit: usize,
        ) -> catalog_storage::Result<Vec<Dataset>> {
            self.inner.list_datasets(offset, limit).await
        }

        async fn count_datasets(&self) -> catalog_storage::Result<usize> {
            self.inner.count_datasets().await
        }

        async fn create_dataset(&self, dataset: &NewDataset) -> catalog_storage::Result<Dataset> {
            self.inner.create_dataset(dataset).await
        }

        async fn update_dataset(
            &self,
            dataset_id: DatasetId,
            source_system: Option<SourceSystem>,
            description: Option<&str>,
            columns: Option<&[NewColumn]>,
        ) -> catalog_storage::Result<()> {
            if columns.is_some() {
                return Err(StorageError::database("disk I/O error"));
            }
            self.inner
                .update_dataset(dataset_id, source_system, description, None)
                .await
        }

        async fn delete_dataset(&self, dataset_id: DatasetId) -> catalog_storage::Result<()> {
            self.inner.delete_dataset(dataset_id).await
        }

        async fn get_edge(
            &self,
            upstream_id: DatasetId,
            downstream_id: DatasetId,
        ) -> catalog_storage::Result<Option<LineageEdge>> {
            self.inner.get_edge(upstream_id, downstream_id).await
        }

        async fn list_all_edges(&self) -> catalog_storage::Result<Vec<LineageEdge>> {
            self.inner.list_all_edges().await
        }

        async fn list_edges_for_dataset(
            &self,
            dataset_id: DatasetId,
        ) -> catalog_storage::Result<Vec<LineageEdge>> {
            self.inner.list_edges_for_dataset(dataset_id).await
        }

        async fn create_edge(
            &self,
            upstream_id: DatasetId,
            downstream_id: DatasetId,
        ) -> catalog_storage::Result<LineageEdge> {
            self.inner.create_edge(upstream_id, downstream_id).await
        }

        async fn delete_edge(
            &self,
            upstream_id: DatasetId,
            downstream_id: DatasetId,
        ) -> catalog_storage::Result<()> {
            self.inner.delete_edge(upstream_id, downstream_id).await
        }

        async fn list_columns_matching(
            &self,
            substring: &str,
        ) -> catalog_storage::Result<Vec<ColumnMatch>> {
            self.inner.list_columns_matching(substring).await
        }

        async fn list_datasets_matching(
            &self,
            field: SearchField,
            substring: &str,
        ) -> catalog_storage::Result<Vec<Dataset>> {
            self.inner.list_datasets_matching(field, substring).await
        }
    }

    fn service() -> DatasetService {
        DatasetService::new(Arc::new(InMemoryCatalogStore::new()))
    }

    fn orders() -> CreateDataset {
        CreateDataset::new("SF", "BI", "Bronze", "Orders_Raw")
            .source_system(SourceSystem::Snowflake)
            .column("order_id", "int")
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();
        let created = service.create(orders()).await.unwrap();
        assert_eq!(created.fqn.as_str(), "sf.bi.bronze.orders_raw");
        assert_eq!(created.columns[0].data_type, "INT");

        let fetched = service.get("sf.bi.bronze.orders_raw").await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_conflict_on_normalized_fqn() {
        let service = service();
        service.create(orders()).await.unwrap();

        let err = service
            .create(CreateDataset::new(" sf ", "bi", "BRONZE", "orders_raw"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            "Dataset 'sf.bi.bronze.orders_raw' already exists."
        );
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let err = service().get("nope.a.b.c").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Dataset 'nope.a.b.c' not found.");
    }

    #[tokio::test]
    async fn test_update_metadata_only_keeps_columns() {
        let service = service();
        let created = service.create(orders()).await.unwrap();

        let updated = service
            .update(
                "sf.bi.bronze.orders_raw",
                UpdateDataset {
                    description: Some("raw orders".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.description.as_deref(), Some("raw orders"));
        assert_eq!(updated.source_system, SourceSystem::Snowflake);
        assert_eq!(updated.columns, created.columns);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_replaces_columns_wholesale() {
        let service = service();
        let created = service.create(orders()).await.unwrap();

        let updated = service
            .update(
                "sf.bi.bronze.orders_raw",
                UpdateDataset {
                    columns: Some(vec![
                        NewColumn::new(" order_id ", "bigint"),
                        NewColumn::new("amount", "decimal"),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let names: Vec<&str> = updated.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["order_id", "amount"]);
        assert_eq!(updated.columns[0].data_type, "BIGINT");
        assert_ne!(updated.columns[0].id, created.columns[0].id);
    }

    #[tokio::test]
    async fn test_update_with_duplicate_columns_changes_nothing() {
        let service = service();
        let created = service.create(orders()).await.unwrap();

        let err = service
            .update(
                "sf.bi.bronze.orders_raw",
                UpdateDataset {
                    description: Some("ignored".to_string()),
                    columns: Some(vec![NewColumn::new("a", "INT"), NewColumn::new("a", "INT")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let unchanged = service.get("sf.bi.bronze.orders_raw").await.unwrap();
        assert_eq!(unchanged.description, None);
        assert_eq!(unchanged.columns, created.columns);
    }

    #[tokio::test]
    async fn test_failed_column_write_leaves_metadata_untouched() {
        let service = DatasetService::new(Arc::new(BrokenColumnWrites {
            inner: InMemoryCatalogStore::new(),
        }));
        let created = service
            .create(CreateDataset::new("sf", "bi", "bronze", "orders").column("a", "INT"))
            .await
            .unwrap();

        let err = service
            .update(
                "sf.bi.bronze.orders",
                UpdateDataset {
                    source_system: Some(SourceSystem::Snowflake),
                    description: Some("new".to_string()),
                    columns: Some(vec![NewColumn::new("b", "INT")]),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("disk I/O error"));

        let unchanged = service.get("sf.bi.bronze.orders").await.unwrap();
        assert_eq!(unchanged.description, None);
        assert_eq!(unchanged.source_system, SourceSystem::Other);
        assert_eq!(unchanged.columns, created.columns);

        // Metadata-only updates do not touch columns and still go through
        let updated = service
            .update(
                "sf.bi.bronze.orders",
                UpdateDataset {
                    description: Some("new".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        service.create(orders()).await.unwrap();
        service.delete("sf.bi.bronze.orders_raw").await.unwrap();

        assert_eq!(service.count().await.unwrap(), 0);
        let err = service.delete("sf.bi.bronze.orders_raw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_pages_by_fqn() {
        let service = service();
        for table in ["c", "a", "b"] {
            service
                .create(CreateDataset::new("x", "x", "x", table))
                .await
                .unwrap();
        }
        let page: Vec<String> = service
            .list(1, 5)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.table_name)
            .collect();
        assert_eq!(page, vec!["b", "c"]);
    }
}
