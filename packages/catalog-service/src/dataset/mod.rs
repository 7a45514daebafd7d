//! Dataset lifecycle: payloads and the orchestrator

pub mod request;
pub mod service;

pub use request::{canonical_columns, CreateDataset, UpdateDataset};
pub use service::DatasetService;
