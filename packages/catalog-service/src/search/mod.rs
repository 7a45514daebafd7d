//! Search: pure ranking plus the repository-backed tier runner

pub mod ranking;
pub mod service;

pub use ranking::{rank, MatchType, TierHit};
pub use service::{SearchResponse, SearchResult, SearchService};
