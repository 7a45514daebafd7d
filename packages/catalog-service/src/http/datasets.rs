use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;

use catalog_storage::Dataset;

use super::error::BoxRequestError;
use super::params::PageParams;
use super::AppState;
use crate::dataset::{CreateDataset, UpdateDataset};

#[instrument(skip_all, err)]
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(payload): Json<CreateDataset>,
) -> Result<(StatusCode, Json<Dataset>), BoxRequestError> {
    let dataset = state.catalog.datasets.create(payload).await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}

#[instrument(skip_all, err)]
pub async fn list_datasets(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<Dataset>>, BoxRequestError> {
    let (skip, limit) = page.resolve(&state.config)?;
    Ok(Json(state.catalog.datasets.list(skip, limit).await?))
}

#[instrument(skip_all, err)]
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(fqn): Path<String>,
) -> Result<Json<Dataset>, BoxRequestError> {
    Ok(Json(state.catalog.datasets.get(&fqn).await?))
}

#[instrument(skip_all, err)]
pub async fn update_dataset(
    State(state): State<AppState>,
    Path(fqn): Path<String>,
    Json(payload): Json<UpdateDataset>,
) -> Result<Json<Dataset>, BoxRequestError> {
    Ok(Json(state.catalog.datasets.update(&fqn, payload).await?))
}

/// Cascades to edges, so it takes the lineage writer lock
#[instrument(skip_all, err)]
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(fqn): Path<String>,
) -> Result<StatusCode, BoxRequestError> {
    let _writer = state.lineage_writer.lock().await;
    state.catalog.datasets.delete(&fqn).await?;
    Ok(StatusCode::NO_CONTENT)
}
