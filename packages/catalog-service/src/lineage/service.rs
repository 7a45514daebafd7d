//! Lineage Orchestrator
//!
//! Turns edge add/remove requests into repository calls, with the graph
//! engine as the gate in front of every insert.
//!
//! Callers must serialize edge mutations: two concurrent adds can each pass
//! the cycle check against their own snapshot and together close a loop.
//! The HTTP layer holds a single writer lock for this.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};

use catalog_storage::{CatalogRepository, Dataset, DatasetId, LineageEdge, LineageNode};

use super::graph::{build_adjacency, would_create_cycle, NeighborIndex};
use crate::error::{CatalogError, Result};
use crate::validation::check_fqn_argument;

/// A dataset and its direct neighbors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLineage {
    pub dataset: Dataset,
    /// What feeds this dataset, ordered by FQN
    #[serde(rename = "upstream_datasets")]
    pub upstream: Vec<LineageNode>,
    /// What this dataset feeds, ordered by FQN
    #[serde(rename = "downstream_datasets")]
    pub downstream: Vec<LineageNode>,
}

/// Edge with both endpoints resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdgeView {
    pub upstream: LineageNode,
    pub downstream: LineageNode,
    pub created_at: DateTime<Utc>,
}

/// `upstream_fqn → downstream_fqn`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRequest {
    pub upstream_fqn: String,
    pub downstream_fqn: String,
}

impl EdgeRequest {
    pub fn new(upstream_fqn: impl Into<String>, downstream_fqn: impl Into<String>) -> Self {
        Self {
            upstream_fqn: upstream_fqn.into(),
            downstream_fqn: downstream_fqn.into(),
        }
    }

    /// Shape checks that need no lookup, self-loops included
    pub fn validate(&self) -> Result<()> {
        check_fqn_argument("upstream_fqn", &self.upstream_fqn)?;
        check_fqn_argument("downstream_fqn", &self.downstream_fqn)?;
        if self.upstream_fqn == self.downstream_fqn {
            return Err(CatalogError::validation(
                "upstream_fqn and downstream_fqn must be different datasets.",
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct LineageService {
    repo: Arc<dyn CatalogRepository>,
}

impl LineageService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Add `upstream → downstream` unless it duplicates an edge or closes a cycle
    pub async fn add_edge(&self, request: &EdgeRequest) -> Result<LineageEdgeView> {
        request.validate()?;
        let (upstream, downstream) = self.resolve_pair(request).await?;

        if self.repo.get_edge(upstream.id, downstream.id).await?.is_some() {
            return Err(CatalogError::conflict(format!(
                "Lineage edge '{}' → '{}' already exists.",
                upstream.fqn, downstream.fqn
            )));
        }

        let edges = self.repo.list_all_edges().await?;
        let adjacency = build_adjacency(edges.iter().map(LineageEdge::pair));
        if would_create_cycle(upstream.id, downstream.id, &adjacency) {
            warn!(
                upstream = %upstream.fqn,
                downstream = %downstream.fqn,
                edges = edges.len(),
                "Rejected lineage edge: cycle"
            );
            return Err(CatalogError::Cycle {
                upstream: upstream.fqn.into_string(),
                downstream: downstream.fqn.into_string(),
            });
        }

        let edge = self.repo.create_edge(upstream.id, downstream.id).await?;
        info!(upstream = %upstream.fqn, downstream = %downstream.fqn, "Added lineage");

        Ok(LineageEdgeView {
            upstream: upstream.to_node(),
            downstream: downstream.to_node(),
            created_at: edge.created_at,
        })
    }

    /// Remove the edge with this exact ordered pair
    pub async fn remove_edge(&self, request: &EdgeRequest) -> Result<()> {
        let (upstream, downstream) = self.resolve_pair(request).await?;

        if self.repo.get_edge(upstream.id, downstream.id).await?.is_none() {
            return Err(CatalogError::not_found(format!(
                "Lineage edge '{}' → '{}' does not exist.",
                request.upstream_fqn, request.downstream_fqn
            )));
        }

        self.repo.delete_edge(upstream.id, downstream.id).await?;
        info!(upstream = %upstream.fqn, downstream = %downstream.fqn, "Removed lineage");
        Ok(())
    }

    /// Direct (1-hop) upstream and downstream neighbors of a dataset
    pub async fn dataset_lineage(&self, fqn: &str) -> Result<DatasetLineage> {
        let dataset = self
            .repo
            .get_dataset_by_fqn(fqn)
            .await?
            .ok_or_else(|| CatalogError::dataset_not_found(fqn))?;

        let edges = self.repo.list_edges_for_dataset(dataset.id).await?;
        let index = NeighborIndex::from_edges(edges.iter().map(LineageEdge::pair));
        let nodes = resolve_nodes(self.repo.as_ref(), index.nodes()).await?;

        Ok(DatasetLineage {
            upstream: neighbors(&nodes, index.upstream_of(dataset.id)),
            downstream: neighbors(&nodes, index.downstream_of(dataset.id)),
            dataset,
        })
    }

    /// Every edge, resolved, in creation order
    pub async fn list_all_edges(&self) -> Result<Vec<LineageEdgeView>> {
        let edges = self.repo.list_all_edges().await?;
        let ids = edges
            .iter()
            .flat_map(|e| [e.upstream_id, e.downstream_id])
            .collect();
        let nodes = resolve_nodes(self.repo.as_ref(), ids).await?;

        Ok(edges
            .iter()
            .filter_map(|edge| {
                Some(LineageEdgeView {
                    upstream: nodes.get(&edge.upstream_id)?.clone(),
                    downstream: nodes.get(&edge.downstream_id)?.clone(),
                    created_at: edge.created_at,
                })
            })
            .collect())
    }

    async fn resolve_pair(&self, request: &EdgeRequest) -> Result<(Dataset, Dataset)> {
        let upstream = self
            .repo
            .get_dataset_by_fqn(&request.upstream_fqn)
            .await?
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "Upstream dataset '{}' not found.",
                    request.upstream_fqn
                ))
            })?;
        let downstream = self
            .repo
            .get_dataset_by_fqn(&request.downstream_fqn)
            .await?
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "Downstream dataset '{}' not found.",
                    request.downstream_fqn
                ))
            })?;
        Ok((upstream, downstream))
    }
}

/// Load the datasets behind `ids` as lineage nodes
pub(crate) async fn resolve_nodes(
    repo: &dyn CatalogRepository,
    ids: BTreeSet<DatasetId>,
) -> Result<BTreeMap<DatasetId, LineageNode>> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let ids: Vec<DatasetId> = ids.into_iter().collect();
    Ok(repo
        .get_datasets_by_ids(&ids)
        .await?
        .iter()
        .map(|d| (d.id, d.to_node()))
        .collect())
}

/// Nodes for `ids`, ordered by FQN
pub(crate) fn neighbors(
    nodes: &BTreeMap<DatasetId, LineageNode>,
    ids: impl Iterator<Item = DatasetId>,
) -> Vec<LineageNode> {
    let mut found: Vec<LineageNode> = ids.filter_map(|id| nodes.get(&id).cloned()).collect();
    found.sort_by(|a, b| a.fqn.cmp(&b.fqn));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CreateDataset, DatasetService};
    use crate::error::ErrorKind;
    use catalog_storage::InMemoryCatalogStore;
    use pretty_assertions::assert_eq;

    async fn setup(tables: &[&str]) -> LineageService {
        let repo: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalogStore::new());
        let datasets = DatasetService::new(repo.clone());
        for table in tables {
            datasets
                .create(CreateDataset::new("s", "d", "x", *table))
                .await
                .unwrap();
        }
        LineageService::new(repo)
    }

    fn edge(up: &str, down: &str) -> EdgeRequest {
        EdgeRequest::new(format!("s.d.x.{}", up), format!("s.d.x.{}", down))
    }

    #[tokio::test]
    async fn test_self_loop_rejected_before_lookup() {
        let service = setup(&[]).await;
        let err = service.add_edge(&edge("ghost", "ghost")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_missing_endpoint_named_in_not_found() {
        let service = setup(&["raw"]).await;

        let err = service.add_edge(&edge("raw", "ghost")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Downstream dataset 's.d.x.ghost' not found.");

        let err = service.add_edge(&edge("ghost", "raw")).await.unwrap_err();
        assert_eq!(err.to_string(), "Upstream dataset 's.d.x.ghost' not found.");
    }

    #[tokio::test]
    async fn test_duplicate_edge_is_conflict() {
        let service = setup(&["raw", "clean"]).await;
        service.add_edge(&edge("raw", "clean")).await.unwrap();

        let err = service.add_edge(&edge("raw", "clean")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            "Lineage edge 's.d.x.raw' → 's.d.x.clean' already exists."
        );
    }

    #[tokio::test]
    async fn test_cycle_rejected_and_graph_unchanged() {
        let service = setup(&["raw", "clean", "agg"]).await;
        service.add_edge(&edge("raw", "clean")).await.unwrap();
        service.add_edge(&edge("clean", "agg")).await.unwrap();

        let err = service.add_edge(&edge("agg", "raw")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert!(err.to_string().contains("cycle"));
        assert!(err.to_string().contains("s.d.x.agg"));
        assert!(err.to_string().contains("s.d.x.raw"));

        assert_eq!(service.list_all_edges().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_edge_returns_resolved_view() {
        let service = setup(&["raw", "clean"]).await;
        let view = service.add_edge(&edge("raw", "clean")).await.unwrap();
        assert_eq!(view.upstream.fqn.as_str(), "s.d.x.raw");
        assert_eq!(view.downstream.fqn.as_str(), "s.d.x.clean");

        let all = service.list_all_edges().await.unwrap();
        assert_eq!(all, vec![view]);
    }

    #[tokio::test]
    async fn test_remove_missing_edge_is_not_found() {
        let service = setup(&["raw", "clean"]).await;
        let err = service.remove_edge(&edge("raw", "clean")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "Lineage edge 's.d.x.raw' → 's.d.x.clean' does not exist."
        );
    }

    #[tokio::test]
    async fn test_dataset_lineage_is_one_hop_sorted() {
        let service = setup(&["raw", "orders", "clean", "agg"]).await;
        service.add_edge(&edge("raw", "clean")).await.unwrap();
        service.add_edge(&edge("orders", "clean")).await.unwrap();
        service.add_edge(&edge("clean", "agg")).await.unwrap();

        let lineage = service.dataset_lineage("s.d.x.clean").await.unwrap();
        let upstream: Vec<&str> = lineage.upstream.iter().map(|n| n.fqn.as_str()).collect();
        let downstream: Vec<&str> = lineage.downstream.iter().map(|n| n.fqn.as_str()).collect();
        assert_eq!(upstream, vec!["s.d.x.orders", "s.d.x.raw"]);
        assert_eq!(downstream, vec!["s.d.x.agg"]);

        // Transitive ancestors are not included
        let agg = service.dataset_lineage("s.d.x.agg").await.unwrap();
        assert_eq!(agg.upstream.len(), 1);
        assert!(agg.downstream.is_empty());
    }

    #[tokio::test]
    async fn test_lineage_serializes_with_dataset_lists() {
        let service = setup(&["raw"]).await;
        let lineage = service.dataset_lineage("s.d.x.raw").await.unwrap();
        let json = serde_json::to_value(&lineage).unwrap();
        assert!(json.get("upstream_datasets").is_some());
        assert!(json.get("downstream_datasets").is_some());
        assert_eq!(json["dataset"]["fqn"], "s.d.x.raw");
    }
}
