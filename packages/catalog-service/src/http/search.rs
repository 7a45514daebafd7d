use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use super::error::BoxRequestError;
use super::params::resolve_limit;
use super::AppState;
use crate::error::CatalogError;
use crate::search::SearchResponse;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[instrument(skip_all, err)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, BoxRequestError> {
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| CatalogError::validation("Query parameter 'q' must not be empty."))?;
    let limit = resolve_limit(params.limit, &state.config)?;
    Ok(Json(state.catalog.search.search(&query, limit).await?))
}
