//! Tiered dataset search
//!
//! Runs the four tier queries against the repository, hands the hits to the
//! ranking engine, truncates, then attaches 1-hop lineage from a single edge
//! snapshot.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use catalog_storage::{CatalogRepository, Dataset, DatasetId, LineageEdge, LineageNode, SearchField};

use super::ranking::{rank, MatchType, TierHit};
use crate::error::Result;
use crate::lineage::graph::NeighborIndex;
use crate::lineage::service::{neighbors, resolve_nodes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub dataset: Dataset,
    pub match_type: MatchType,
    pub matched_on: String,
    pub priority: u8,
    #[serde(rename = "upstream_datasets")]
    pub upstream: Vec<LineageNode>,
    #[serde(rename = "downstream_datasets")]
    pub downstream: Vec<LineageNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The trimmed search term
    pub query: String,
    /// Distinct matches before truncation
    pub total: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct SearchService {
    repo: Arc<dyn CatalogRepository>,
}

impl SearchService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// Ranked, de-duplicated matches for `query`, at most `limit` of them
    ///
    /// Blank input yields an empty response rather than an error.
    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchResponse> {
        let term = query.trim();
        if term.is_empty() {
            return Ok(SearchResponse {
                query: term.to_string(),
                total: 0,
                results: Vec::new(),
            });
        }

        let mut hits = Vec::new();
        for match_type in MatchType::ALL {
            let tier = self.run_tier(match_type, term).await?;
            debug!(term, tier = match_type.as_str(), hits = tier.len(), "Search tier");
            hits.extend(tier);
        }

        let mut ranked = rank(hits);
        let total = ranked.len();
        ranked.truncate(limit);

        let results = self.enrich(ranked).await?;
        debug!(term, total, returned = results.len(), "Search finished");

        Ok(SearchResponse {
            query: term.to_string(),
            total,
            results,
        })
    }

    async fn run_tier(&self, match_type: MatchType, term: &str) -> Result<Vec<TierHit>> {
        let field = match match_type {
            MatchType::TableName => SearchField::Table,
            MatchType::SchemaName => SearchField::Schema,
            MatchType::DatabaseName => SearchField::Database,
            MatchType::ColumnName => return self.column_tier(term).await,
        };

        Ok(self
            .repo
            .list_datasets_matching(field, term)
            .await?
            .into_iter()
            .map(|dataset| {
                let matched_on = field.value_of(&dataset).to_string();
                TierHit::new(dataset, match_type, matched_on)
            })
            .collect())
    }

    /// Datasets owning a matching column; the first such column names the hit
    async fn column_tier(&self, term: &str) -> Result<Vec<TierHit>> {
        let mut first_match: BTreeMap<DatasetId, String> = BTreeMap::new();
        for column in self.repo.list_columns_matching(term).await? {
            first_match
                .entry(column.dataset_id)
                .or_insert(column.column_name);
        }
        if first_match.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DatasetId> = first_match.keys().copied().collect();
        Ok(self
            .repo
            .get_datasets_by_ids(&ids)
            .await?
            .into_iter()
            .filter_map(|dataset| {
                let column = first_match.remove(&dataset.id)?;
                Some(TierHit::new(dataset, MatchType::ColumnName, column))
            })
            .collect())
    }

    async fn enrich(&self, ranked: Vec<TierHit>) -> Result<Vec<SearchResult>> {
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let edges = self.repo.list_all_edges().await?;
        let index = NeighborIndex::from_edges(edges.iter().map(LineageEdge::pair));

        let neighbor_ids: BTreeSet<DatasetId> = ranked
            .iter()
            .flat_map(|hit| {
                index
                    .upstream_of(hit.dataset.id)
                    .chain(index.downstream_of(hit.dataset.id))
            })
            .collect();
        let nodes = resolve_nodes(self.repo.as_ref(), neighbor_ids).await?;

        Ok(ranked
            .into_iter()
            .map(|hit| SearchResult {
                upstream: neighbors(&nodes, index.upstream_of(hit.dataset.id)),
                downstream: neighbors(&nodes, index.downstream_of(hit.dataset.id)),
                priority: hit.priority(),
                match_type: hit.match_type,
                matched_on: hit.matched_on,
                dataset: hit.dataset,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CreateDataset, DatasetService};
    use crate::lineage::{EdgeRequest, LineageService};
    use catalog_storage::InMemoryCatalogStore;
    use pretty_assertions::assert_eq;

    struct Fixture {
        datasets: DatasetService,
        lineage: LineageService,
        search: SearchService,
    }

    fn fixture() -> Fixture {
        let repo: Arc<dyn CatalogRepository> = Arc::new(InMemoryCatalogStore::new());
        Fixture {
            datasets: DatasetService::new(repo.clone()),
            lineage: LineageService::new(repo.clone()),
            search: SearchService::new(repo),
        }
    }

    fn summary(response: &SearchResponse) -> Vec<(&str, u8, &str)> {
        response
            .results
            .iter()
            .map(|r| (r.dataset.fqn.as_str(), r.priority, r.matched_on.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn test_blank_query_is_empty() {
        let f = fixture();
        f.datasets
            .create(CreateDataset::new("a", "b", "c", "d"))
            .await
            .unwrap();

        let response = f.search.search("   ", 10).await.unwrap();
        assert_eq!(response.total, 0);
        assert!(response.results.is_empty());
        assert_eq!(response.query, "");
    }

    #[tokio::test]
    async fn test_each_tier_and_dedupe() {
        let f = fixture();
        for request in [
            CreateDataset::new("c", "sales", "public", "orders"),
            CreateDataset::new("c", "sales", "orders_schema", "items").column("order_ref", "INT"),
            CreateDataset::new("c", "orders_db", "public", "customers"),
            CreateDataset::new("c", "misc", "public", "payments")
                .column("id", "INT")
                .column("order_id", "INT")
                .column("order_key", "INT"),
        ] {
            f.datasets.create(request).await.unwrap();
        }

        let response = f.search.search("  ORDER ", 50).await.unwrap();
        assert_eq!(response.query, "ORDER");
        assert_eq!(response.total, 4);
        assert_eq!(
            summary(&response),
            vec![
                ("c.sales.public.orders", 1, "orders"),
                ("c.misc.public.payments", 2, "order_id"),
                ("c.sales.orders_schema.items", 2, "order_ref"),
                ("c.orders_db.public.customers", 4, "orders_db"),
            ]
        );
        assert_eq!(response.results[0].match_type, MatchType::TableName);
    }

    #[tokio::test]
    async fn test_truncation_happens_after_ranking() {
        let f = fixture();
        f.datasets
            .create(CreateDataset::new("c", "orders", "orders", "aaa"))
            .await
            .unwrap();
        f.datasets
            .create(CreateDataset::new("c", "x", "x", "zzz_orders"))
            .await
            .unwrap();

        let response = f.search.search("orders", 1).await.unwrap();
        assert_eq!(response.total, 2);
        assert_eq!(summary(&response), vec![("c.x.x.zzz_orders", 1, "zzz_orders")]);
    }

    #[tokio::test]
    async fn test_results_carry_direct_neighbors() {
        let f = fixture();
        for table in ["raw", "orders", "agg"] {
            f.datasets
                .create(CreateDataset::new("s", "d", "x", table))
                .await
                .unwrap();
        }
        f.lineage
            .add_edge(&EdgeRequest::new("s.d.x.raw", "s.d.x.orders"))
            .await
            .unwrap();
        f.lineage
            .add_edge(&EdgeRequest::new("s.d.x.orders", "s.d.x.agg"))
            .await
            .unwrap();

        let response = f.search.search("orders", 10).await.unwrap();
        let result = &response.results[0];
        assert_eq!(result.upstream.len(), 1);
        assert_eq!(result.upstream[0].fqn.as_str(), "s.d.x.raw");
        assert_eq!(result.downstream[0].fqn.as_str(), "s.d.x.agg");
    }

    #[tokio::test]
    async fn test_response_json_shape() {
        let f = fixture();
        f.datasets
            .create(CreateDataset::new("c", "d", "s", "orders"))
            .await
            .unwrap();

        let response = f.search.search("orders", 10).await.unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["results"][0]["match_type"], "table_name");
        assert_eq!(json["results"][0]["priority"], 1);
        assert!(json["results"][0]["upstream_datasets"].is_array());
    }
}
