//! Search Ranking Engine
//!
//! Merges tier hits into one ranked list: at most one entry per dataset,
//! kept at its best tier, ordered by (priority, FQN).

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use catalog_storage::{Dataset, Fqn};

/// What part of a dataset matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    TableName,
    ColumnName,
    SchemaName,
    DatabaseName,
}

impl MatchType {
    /// Tiers in the order they are run
    pub const ALL: [MatchType; 4] = [
        MatchType::TableName,
        MatchType::ColumnName,
        MatchType::SchemaName,
        MatchType::DatabaseName,
    ];

    /// Lower is shown first
    pub fn priority(&self) -> u8 {
        match self {
            MatchType::TableName => 1,
            MatchType::ColumnName => 2,
            MatchType::SchemaName => 3,
            MatchType::DatabaseName => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::TableName => "table_name",
            MatchType::ColumnName => "column_name",
            MatchType::SchemaName => "schema_name",
            MatchType::DatabaseName => "database_name",
        }
    }
}

/// One dataset found by one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierHit {
    pub dataset: Dataset,
    pub match_type: MatchType,
    /// The literal name that matched
    pub matched_on: String,
}

impl TierHit {
    pub fn new(dataset: Dataset, match_type: MatchType, matched_on: impl Into<String>) -> Self {
        Self {
            dataset,
            match_type,
            matched_on: matched_on.into(),
        }
    }

    pub fn priority(&self) -> u8 {
        self.match_type.priority()
    }
}

/// Deduplicate by FQN and sort by (priority, FQN)
///
/// A dataset seen by several tiers keeps its best (lowest) priority; within
/// one tier the first hit wins. No truncation happens here.
pub fn rank<I>(hits: I) -> Vec<TierHit>
where
    I: IntoIterator<Item = TierHit>,
{
    let mut best: BTreeMap<Fqn, TierHit> = BTreeMap::new();
    for hit in hits {
        match best.entry(hit.dataset.fqn.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(hit);
            }
            Entry::Occupied(mut slot) => {
                if hit.priority() < slot.get().priority() {
                    slot.insert(hit);
                }
            }
        }
    }

    let mut ranked: Vec<TierHit> = best.into_values().collect();
    // FQN order is already given by the map; a stable sort keeps it per tier
    ranked.sort_by_key(TierHit::priority);
    ranked
}
