//! The three orchestrators over one shared repository

use std::sync::Arc;

use catalog_storage::CatalogRepository;

use crate::dataset::DatasetService;
use crate::lineage::LineageService;
use crate::search::SearchService;

#[derive(Clone)]
pub struct Catalog {
    pub datasets: DatasetService,
    pub lineage: LineageService,
    pub search: SearchService,
}

impl Catalog {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self {
            datasets: DatasetService::new(repo.clone()),
            lineage: LineageService::new(repo.clone()),
            search: SearchService::new(repo),
        }
    }
}
