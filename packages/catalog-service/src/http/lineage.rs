use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use super::error::BoxRequestError;
use super::AppState;
use crate::error::CatalogError;
use crate::lineage::{DatasetLineage, EdgeRequest, LineageEdgeView};

/// `?upstream_fqn=..&downstream_fqn=..`, both required
#[derive(Debug, Deserialize)]
pub struct EdgeParams {
    pub upstream_fqn: Option<String>,
    pub downstream_fqn: Option<String>,
}

impl EdgeParams {
    fn into_request(self) -> Result<EdgeRequest, CatalogError> {
        let required = |name: &str, value: Option<String>| {
            value.ok_or_else(|| {
                CatalogError::validation(format!("Query parameter '{}' is required.", name))
            })
        };
        Ok(EdgeRequest::new(
            required("upstream_fqn", self.upstream_fqn)?,
            required("downstream_fqn", self.downstream_fqn)?,
        ))
    }
}

/// The cycle check and the insert run under the writer lock, so no other
/// edge mutation can slip in between them.
#[instrument(skip_all, err)]
pub async fn add_lineage(
    State(state): State<AppState>,
    Json(payload): Json<EdgeRequest>,
) -> Result<(StatusCode, Json<LineageEdgeView>), BoxRequestError> {
    let _writer = state.lineage_writer.lock().await;
    let edge = state.catalog.lineage.add_edge(&payload).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

#[instrument(skip_all, err)]
pub async fn remove_lineage(
    State(state): State<AppState>,
    Query(params): Query<EdgeParams>,
) -> Result<StatusCode, BoxRequestError> {
    let request = params.into_request()?;
    let _writer = state.lineage_writer.lock().await;
    state.catalog.lineage.remove_edge(&request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, err)]
pub async fn get_dataset_lineage(
    State(state): State<AppState>,
    Path(fqn): Path<String>,
) -> Result<Json<DatasetLineage>, BoxRequestError> {
    Ok(Json(state.catalog.lineage.dataset_lineage(&fqn).await?))
}

#[instrument(skip_all, err)]
pub async fn list_lineage(
    State(state): State<AppState>,
) -> Result<Json<Vec<LineageEdgeView>>, BoxRequestError> {
    Ok(Json(state.catalog.lineage.list_all_edges().await?))
}
