//! HTTP boundary
//!
//! JSON routes mounted under `api_prefix`, plus a root health probe.
//! Status codes come from `CatalogError::kind`, see [`error`].

pub mod datasets;
pub mod error;
pub mod health;
pub mod lineage;
pub mod params;
pub mod search;

pub use error::{BoxRequestError, RequestError};

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Arc<CatalogConfig>,
    /// Serializes every mutation of the edge set (add/remove edge, dataset
    /// delete) so concurrent cycle checks never see stale snapshots
    pub lineage_writer: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(catalog: Catalog, config: Arc<CatalogConfig>) -> Self {
        Self {
            catalog,
            config,
            lineage_writer: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route(
            "/datasets",
            get(datasets::list_datasets).post(datasets::create_dataset),
        )
        .route(
            "/datasets/:fqn",
            get(datasets::get_dataset)
                .put(datasets::update_dataset)
                .delete(datasets::delete_dataset),
        )
        .route(
            "/lineage",
            get(lineage::list_lineage)
                .post(lineage::add_lineage)
                .delete(lineage::remove_lineage),
        )
        .route("/lineage/:fqn", get(lineage::get_dataset_lineage))
        .route("/search", get(search::search));

    // axum refuses to nest at the root
    let app = match state.config.api_prefix.as_str() {
        "/" => api,
        prefix => Router::new().nest(prefix, api),
    };

    app.route("/", get(health::health)).with_state(state)
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
