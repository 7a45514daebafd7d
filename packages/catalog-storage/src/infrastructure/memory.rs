//! In-Memory Catalog Store
//!
//! Arena of records keyed by surrogate id, guarded by a single lock so every
//! trait call is atomic. Used by unit tests and `memory://` deployments.
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::domain::models::{
    contains_ignore_case, Column, ColumnId, ColumnMatch, Dataset, DatasetId, EdgeId, LineageEdge,
    NewColumn, NewDataset, SearchField, SourceSystem,
};
use crate::domain::ports::CatalogRepository;
use crate::{Result, StorageError};

#[derive(Default)]
struct Arena {
    last_dataset_id: DatasetId,
    last_column_id: ColumnId,
    last_edge_id: EdgeId,
    /// Stored with an empty `columns` list; columns live in `columns`
    datasets: BTreeMap<DatasetId, Dataset>,
    fqn_index: HashMap<String, DatasetId>,
    columns: BTreeMap<ColumnId, Column>,
    edges: BTreeMap<EdgeId, LineageEdge>,
}

impl Arena {
    fn hydrate(&self, dataset: &Dataset) -> Dataset {
        let mut hydrated = dataset.clone();
        hydrated.columns = self
            .columns
            .values()
            .filter(|c| c.dataset_id == dataset.id)
            .cloned()
            .collect();
        hydrated
    }

    fn insert_columns(&mut self, dataset_id: DatasetId, columns: &[NewColumn]) -> Result<()> {
        check_unique_names(columns)?;
        for column in columns {
            self.last_column_id += 1;
            self.columns.insert(
                self.last_column_id,
                Column {
                    id: self.last_column_id,
                    dataset_id,
                    name: column.name.clone(),
                    data_type: column.data_type.clone(),
                    description: column.description.clone(),
                },
            );
        }
        Ok(())
    }

    fn require_dataset(&mut self, dataset_id: DatasetId) -> Result<&mut Dataset> {
        self.datasets
            .get_mut(&dataset_id)
            .ok_or_else(|| StorageError::dataset_not_found(dataset_id))
    }

    fn sorted_by_fqn(&self, mut datasets: Vec<Dataset>) -> Vec<Dataset> {
        datasets.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        datasets.iter().map(|d| self.hydrate(d)).collect()
    }
}

fn check_unique_names(columns: &[NewColumn]) -> Result<()> {
    let mut seen = HashSet::new();
    match columns.iter().find(|c| !seen.insert(c.name.as_str())) {
        Some(dup) => Err(StorageError::constraint(format!(
            "UNIQUE constraint failed: dataset_columns.dataset_id, dataset_columns.name ({})",
            dup.name
        ))),
        None => Ok(()),
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    arena: Arc<RwLock<Arena>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogStore {
    async fn get_dataset_by_fqn(&self, fqn: &str) -> Result<Option<Dataset>> {
        let arena = self.arena.read();
        Ok(arena
            .fqn_index
            .get(fqn)
            .and_then(|id| arena.datasets.get(id))
            .map(|d| arena.hydrate(d)))
    }

    async fn get_dataset(&self, id: DatasetId) -> Result<Option<Dataset>> {
        let arena = self.arena.read();
        Ok(arena.datasets.get(&id).map(|d| arena.hydrate(d)))
    }

    async fn get_datasets_by_ids(&self, ids: &[DatasetId]) -> Result<Vec<Dataset>> {
        let arena = self.arena.read();
        let unique: BTreeSet<DatasetId> = ids.iter().copied().collect();
        let found = unique
            .iter()
            .filter_map(|id| arena.datasets.get(id))
            .cloned()
            .collect();
        Ok(arena.sorted_by_fqn(found))
    }

    async fn list_datasets(&self, offset: usize, limit: usize) -> Result<Vec<Dataset>> {
        let arena = self.arena.read();
        let all = arena.sorted_by_fqn(arena.datasets.values().cloned().collect());
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_datasets(&self) -> Result<usize> {
        Ok(self.arena.read().datasets.len())
    }

    async fn create_dataset(&self, dataset: &NewDataset) -> Result<Dataset> {
        let mut arena = self.arena.write();
        let fqn = dataset.fqn();
        if arena.fqn_index.contains_key(fqn.as_str()) {
            return Err(StorageError::constraint(format!(
                "UNIQUE constraint failed: datasets.fqn ({})",
                fqn
            )));
        }

        // Columns are checked before any mutation so a failure leaves no trace
        check_unique_names(&dataset.columns)?;

        let now = Utc::now();
        arena.last_dataset_id += 1;
        let id = arena.last_dataset_id;
        arena.datasets.insert(
            id,
            Dataset {
                id,
                fqn: fqn.clone(),
                connection_name: dataset.parts.connection_name.clone(),
                database_name: dataset.parts.database_name.clone(),
                schema_name: dataset.parts.schema_name.clone(),
                table_name: dataset.parts.table_name.clone(),
                source_system: dataset.source_system,
                description: dataset.description.clone(),
                columns: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );
        arena.fqn_index.insert(fqn.into_string(), id);
        arena.insert_columns(id, &dataset.columns)?;

        let stored = &arena.datasets[&id];
        Ok(arena.hydrate(stored))
    }

    async fn update_dataset(
        &self,
        dataset_id: DatasetId,
        source_system: Option<SourceSystem>,
        description: Option<&str>,
        columns: Option<&[NewColumn]>,
    ) -> Result<()> {
        let mut arena = self.arena.write();
        arena.require_dataset(dataset_id)?;

        if let Some(columns) = columns {
            // Checked before the old columns go, so a failure leaves no trace
            check_unique_names(columns)?;
            arena.columns.retain(|_, c| c.dataset_id != dataset_id);
            arena.insert_columns(dataset_id, columns)?;
        }

        let dataset = arena.require_dataset(dataset_id)?;
        if let Some(source_system) = source_system {
            dataset.source_system = source_system;
        }
        if let Some(description) = description {
            dataset.description = Some(description.to_string());
        }
        dataset.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<()> {
        let mut arena = self.arena.write();
        let removed = arena
            .datasets
            .remove(&dataset_id)
            .ok_or_else(|| StorageError::dataset_not_found(dataset_id))?;
        arena.fqn_index.remove(removed.fqn.as_str());
        arena.columns.retain(|_, c| c.dataset_id != dataset_id);
        arena.edges.retain(|_, e| !e.touches(dataset_id));
        Ok(())
    }

    async fn get_edge(
        &self,
        upstream_id: DatasetId,
        downstream_id: DatasetId,
    ) -> Result<Option<LineageEdge>> {
        Ok(self
            .arena
            .read()
            .edges
            .values()
            .find(|e| e.pair() == (upstream_id, downstream_id))
            .copied())
    }

    async fn list_all_edges(&self) -> Result<Vec<LineageEdge>> {
        Ok(self.arena.read().edges.values().copied().collect())
    }

    async fn list_edges_for_dataset(&self, dataset_id: DatasetId) -> Result<Vec<LineageEdge>> {
        Ok(self
            .arena
            .read()
            .edges
            .values()
            .filter(|e| e.touches(dataset_id))
            .copied()
            .collect())
    }

    async fn create_edge(
        &self,
        upstream_id: DatasetId,
        downstream_id: DatasetId,
    ) -> Result<LineageEdge> {
        let mut arena = self.arena.write();
        if upstream_id == downstream_id {
            return Err(StorageError::constraint(format!(
                "CHECK constraint failed: lineage self-loop on dataset id={}",
                upstream_id
            )));
        }
        for id in [upstream_id, downstream_id] {
            if !arena.datasets.contains_key(&id) {
                return Err(StorageError::constraint(format!(
                    "FOREIGN KEY constraint failed: lineage references missing dataset id={}",
                    id
                )));
            }
        }
        if arena
            .edges
            .values()
            .any(|e| e.pair() == (upstream_id, downstream_id))
        {
            return Err(StorageError::constraint(
                "UNIQUE constraint failed: lineage.upstream_id, lineage.downstream_id",
            ));
        }

        arena.last_edge_id += 1;
        let edge = LineageEdge {
            id: arena.last_edge_id,
            upstream_id,
            downstream_id,
            created_at: Utc::now(),
        };
        arena.edges.insert(edge.id, edge);
        Ok(edge)
    }

    async fn delete_edge(&self, upstream_id: DatasetId, downstream_id: DatasetId) -> Result<()> {
        self.arena
            .write()
            .edges
            .retain(|_, e| e.pair() != (upstream_id, downstream_id));
        Ok(())
    }

    async fn list_columns_matching(&self, substring: &str) -> Result<Vec<ColumnMatch>> {
        Ok(self
            .arena
            .read()
            .columns
            .values()
            .filter(|c| contains_ignore_case(&c.name, substring))
            .map(|c| ColumnMatch {
                dataset_id: c.dataset_id,
                column_name: c.name.clone(),
            })
            .collect())
    }

    async fn list_datasets_matching(
        &self,
        field: SearchField,
        substring: &str,
    ) -> Result<Vec<Dataset>> {
        let arena = self.arena.read();
        let matches = arena
            .datasets
            .values()
            .filter(|d| contains_ignore_case(field.value_of(d), substring))
            .cloned()
            .collect();
        Ok(arena.sorted_by_fqn(matches))
    }
}
