//! Dataset create/update payloads and their validation

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use catalog_storage::{Fqn, FqnParts, NewColumn, NewDataset, SourceSystem};

use crate::error::{CatalogError, Result};
use crate::validation::{
    check_max_length, check_optional_length, require_length, MAX_COLUMN_DESCRIPTION_LEN,
    MAX_COLUMN_NAME_LEN, MAX_COMPONENT_LEN, MAX_DATA_TYPE_LEN, MAX_DESCRIPTION_LEN,
};

/// Payload for registering a dataset
///
/// The FQN is derived from the four components; it is never accepted
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDataset {
    pub connection_name: String,
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    #[serde(default)]
    pub source_system: SourceSystem,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<NewColumn>,
}

impl CreateDataset {
    pub fn new(
        connection_name: impl Into<String>,
        database_name: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_name: connection_name.into(),
            database_name: database_name.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            source_system: SourceSystem::default(),
            description: None,
            columns: Vec::new(),
        }
    }

    pub fn source_system(mut self, source_system: SourceSystem) -> Self {
        self.source_system = source_system;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(NewColumn::new(name, data_type));
        self
    }

    /// Normalized identity components
    pub fn parts(&self) -> FqnParts {
        FqnParts::new(
            &self.connection_name,
            &self.database_name,
            &self.schema_name,
            &self.table_name,
        )
    }

    /// Normalize, check limits and canonicalize columns
    pub fn into_new_dataset(self) -> Result<NewDataset> {
        let parts = self.parts();
        require_length("connection_name", &parts.connection_name, MAX_COMPONENT_LEN)?;
        require_length("database_name", &parts.database_name, MAX_COMPONENT_LEN)?;
        require_length("schema_name", &parts.schema_name, MAX_COMPONENT_LEN)?;
        require_length("table_name", &parts.table_name, MAX_COMPONENT_LEN)?;
        check_optional_length("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        let columns = canonical_columns(&self.columns, &parts.fqn())?;
        Ok(NewDataset {
            parts,
            source_system: self.source_system,
            description: self.description,
            columns,
        })
    }
}

/// Payload for changing an existing dataset
///
/// Identity components are immutable. `columns`, when present, replaces the
/// whole column list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDataset {
    #[serde(default)]
    pub source_system: Option<SourceSystem>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<NewColumn>>,
}

impl UpdateDataset {
    pub fn validate(&self) -> Result<()> {
        check_optional_length("description", self.description.as_deref(), MAX_DESCRIPTION_LEN)
    }
}

/// Trim names, upper-case types, check limits and reject repeated names
pub fn canonical_columns(columns: &[NewColumn], fqn: &Fqn) -> Result<Vec<NewColumn>> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .map(|column| {
            let column = column.canonical();
            require_length("columns.name", &column.name, MAX_COLUMN_NAME_LEN)?;
            check_max_length("columns.data_type", &column.data_type, MAX_DATA_TYPE_LEN)?;
            check_optional_length(
                "columns.description",
                column.description.as_deref(),
                MAX_COLUMN_DESCRIPTION_LEN,
            )?;
            if !seen.insert(column.name.clone()) {
                return Err(CatalogError::conflict(format!(
                    "Column '{}' appears more than once in dataset '{}'.",
                    column.name, fqn
                )));
            }
            Ok(column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_normalizes_identity_and_columns() {
        let new = CreateDataset::new(" Snowflake_Prod ", "BI_Team", "Bronze", "Orders_Raw")
            .source_system(SourceSystem::Snowflake)
            .column(" order_id ", "int")
            .column("ordered_at", " timestamp ")
            .into_new_dataset()
            .unwrap();

        assert_eq!(new.fqn().as_str(), "snowflake_prod.bi_team.bronze.orders_raw");
        assert_eq!(new.columns[0], NewColumn::new("order_id", "INT"));
        assert_eq!(new.columns[1], NewColumn::new("ordered_at", "TIMESTAMP"));
    }

    #[test]
    fn test_blank_component_is_validation_error() {
        let err = CreateDataset::new("sf", "   ", "bronze", "orders")
            .into_new_dataset()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("database_name"));
    }

    #[test]
    fn test_overlong_fields_rejected() {
        let long_table = "t".repeat(MAX_COMPONENT_LEN + 1);
        assert!(CreateDataset::new("sf", "bi", "bronze", long_table)
            .into_new_dataset()
            .is_err());

        let long_description = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        let err = CreateDataset::new("sf", "bi", "bronze", "orders")
            .description(long_description)
            .into_new_dataset()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let long_type = "X".repeat(MAX_DATA_TYPE_LEN + 1);
        assert!(CreateDataset::new("sf", "bi", "bronze", "orders")
            .column("id", long_type)
            .into_new_dataset()
            .is_err());
    }

    #[test]
    fn test_duplicate_column_after_trim_is_conflict() {
        let err = CreateDataset::new("sf", "bi", "bronze", "orders")
            .column("id", "INT")
            .column(" id ", "BIGINT")
            .into_new_dataset()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_create_payload_defaults() {
        let payload: CreateDataset = serde_json::from_str(
            r#"{"connection_name": "c", "database_name": "d", "schema_name": "s", "table_name": "t"}"#,
        )
        .unwrap();
        assert_eq!(payload.source_system, SourceSystem::Other);
        assert!(payload.columns.is_empty());
        assert_eq!(payload.description, None);
    }

    #[test]
    fn test_unknown_source_system_rejected_by_deserializer() {
        let result: std::result::Result<CreateDataset, _> = serde_json::from_str(
            r#"{"connection_name": "c", "database_name": "d", "schema_name": "s",
                "table_name": "t", "source_system": "Oracle"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_validate() {
        assert!(UpdateDataset::default().validate().is_ok());
        let update = UpdateDataset {
            description: Some("x".repeat(MAX_DESCRIPTION_LEN + 1)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
