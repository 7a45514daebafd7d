//! Catalog Domain Models
//!
//! Records are kept in an arena keyed by surrogate ids. Columns and lineage
//! edges reference datasets through `DatasetId`, never through embedded
//! pointers, so cascade-delete is an index scan plus bulk removal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Surrogate dataset identifier (assigned by the store)
pub type DatasetId = i64;

/// Surrogate column identifier
pub type ColumnId = i64;

/// Surrogate lineage edge identifier
pub type EdgeId = i64;

/// Data type label used when a column is declared without one
pub const DEFAULT_DATA_TYPE: &str = "STRING";

// ═══════════════════════════════════════════════════════════════════════════
// Source System
// ═══════════════════════════════════════════════════════════════════════════

/// Closed set of systems a dataset can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceSystem {
    #[serde(rename = "MySQL")]
    MySql,
    #[serde(rename = "MSSQL")]
    MsSql,
    #[serde(rename = "PostgreSQL")]
    PostgreSql,
    #[serde(rename = "Snowflake")]
    Snowflake,
    #[serde(rename = "BigQuery")]
    BigQuery,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl SourceSystem {
    pub const ALL: [SourceSystem; 6] = [
        SourceSystem::MySql,
        SourceSystem::MsSql,
        SourceSystem::PostgreSql,
        SourceSystem::Snowflake,
        SourceSystem::BigQuery,
        SourceSystem::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSystem::MySql => "MySQL",
            SourceSystem::MsSql => "MSSQL",
            SourceSystem::PostgreSql => "PostgreSQL",
            SourceSystem::Snowflake => "Snowflake",
            SourceSystem::BigQuery => "BigQuery",
            SourceSystem::Other => "Other",
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the supported source systems
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid source system '{0}'. Valid values: MySQL, MSSQL, PostgreSQL, Snowflake, BigQuery, Other")]
pub struct ParseSourceSystemError(pub String);

impl FromStr for SourceSystem {
    type Err = ParseSourceSystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceSystem::ALL
            .into_iter()
            .find(|system| system.as_str() == s)
            .ok_or_else(|| ParseSourceSystemError(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Fully Qualified Name
// ═══════════════════════════════════════════════════════════════════════════

/// The four identity components of a dataset, normalized
///
/// Each component is trimmed and lower-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FqnParts {
    pub connection_name: String,
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
}

impl FqnParts {
    pub fn new(
        connection_name: &str,
        database_name: &str,
        schema_name: &str,
        table_name: &str,
    ) -> Self {
        Self {
            connection_name: normalize_component(connection_name),
            database_name: normalize_component(database_name),
            schema_name: normalize_component(schema_name),
            table_name: normalize_component(table_name),
        }
    }

    /// `connection.database.schema.table`
    pub fn fqn(&self) -> Fqn {
        Fqn(format!(
            "{}.{}.{}.{}",
            self.connection_name, self.database_name, self.schema_name, self.table_name
        ))
    }
}

/// Trim and lower-case one identity component
pub fn normalize_component(component: &str) -> String {
    component.trim().to_lowercase()
}

/// Fully qualified dataset name
///
/// Only constructed from normalized [`FqnParts`], so two equal datasets
/// always produce byte-identical names.
///
/// ```rust
/// use catalog_storage::domain::FqnParts;
///
/// let fqn = FqnParts::new(" Snowflake_Prod ", "Sales", "PUBLIC", "orders").fqn();
/// assert_eq!(fqn.as_str(), "snowflake_prod.sales.public.orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fqn(String);

impl Fqn {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fqn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════════

/// A table or file tracked by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(skip_serializing)]
    #[serde(default)]
    pub id: DatasetId,
    pub fqn: Fqn,
    pub connection_name: String,
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub source_system: SourceSystem,
    pub description: Option<String>,
    /// Ordered by column id (insertion order)
    pub columns: Vec<Column>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dataset {
    /// Minimal view embedded in lineage and search responses
    pub fn to_node(&self) -> LineageNode {
        LineageNode {
            fqn: self.fqn.clone(),
            source_system: self.source_system,
            description: self.description.clone(),
        }
    }
}

/// A column owned by exactly one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    #[serde(skip)]
    pub dataset_id: DatasetId,
    pub name: String,
    pub data_type: String,
    pub description: Option<String>,
}

/// Column payload before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_data_type() -> String {
    DEFAULT_DATA_TYPE.to_string()
}

impl NewColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: None,
        }
    }

    /// Name trimmed, data type trimmed and upper-cased
    pub fn canonical(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            data_type: self.data_type.trim().to_uppercase(),
            description: self.description.clone(),
        }
    }
}

/// Dataset payload before the store assigns an id
///
/// The FQN is derived from `parts`, so the store never receives a name that
/// disagrees with its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDataset {
    pub parts: FqnParts,
    pub source_system: SourceSystem,
    pub description: Option<String>,
    pub columns: Vec<NewColumn>,
}

impl NewDataset {
    pub fn fqn(&self) -> Fqn {
        self.parts.fqn()
    }
}

/// Directed lineage edge: `upstream → downstream`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub id: EdgeId,
    pub upstream_id: DatasetId,
    pub downstream_id: DatasetId,
    pub created_at: DateTime<Utc>,
}

impl LineageEdge {
    pub fn pair(&self) -> (DatasetId, DatasetId) {
        (self.upstream_id, self.downstream_id)
    }

    pub fn touches(&self, dataset_id: DatasetId) -> bool {
        self.upstream_id == dataset_id || self.downstream_id == dataset_id
    }
}

/// Minimal dataset info embedded in lineage and search responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageNode {
    pub fqn: Fqn,
    pub source_system: SourceSystem,
    pub description: Option<String>,
}

/// Identity component a dataset-level substring search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Table,
    Schema,
    Database,
}

impl SearchField {
    pub fn column_name(&self) -> &'static str {
        match self {
            SearchField::Table => "table_name",
            SearchField::Schema => "schema_name",
            SearchField::Database => "database_name",
        }
    }

    pub fn value_of<'a>(&self, dataset: &'a Dataset) -> &'a str {
        match self {
            SearchField::Table => &dataset.table_name,
            SearchField::Schema => &dataset.schema_name,
            SearchField::Database => &dataset.database_name,
        }
    }
}

/// A column whose name matched a substring query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMatch {
    pub dataset_id: DatasetId,
    pub column_name: String,
}

/// Case-insensitive substring containment used by every search tier
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
