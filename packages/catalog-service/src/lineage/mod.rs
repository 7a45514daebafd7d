//! Lineage: the pure graph engine and the edge orchestrator
//!
//! - `graph`: adjacency, cycle check and 1-hop neighbor index over a snapshot
//! - `service`: add/remove/query edges against the repository

pub mod graph;
pub mod service;

pub use graph::{build_adjacency, would_create_cycle, Adjacency, NeighborIndex};
pub use service::{DatasetLineage, EdgeRequest, LineageEdgeView, LineageService};
