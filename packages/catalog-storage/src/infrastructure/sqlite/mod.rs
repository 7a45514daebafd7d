//! SQLite Catalog Store
//!
//! File-based persistent storage using SQLite. The schema is created on
//! open; foreign keys cascade column and edge rows when a dataset is deleted.
//!
//! SQLite's `LIKE` and `lower()` only fold ASCII, so substring search goes
//! through `contains_ci`, a scalar function registered on every connection
//! that applies the same Unicode folding as the in-memory store.
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::domain::models::{
    contains_ignore_case, Column, ColumnMatch, Dataset, DatasetId, Fqn, FqnParts, LineageEdge, NewColumn, NewDataset,
    SearchField, SourceSystem,
};
use crate::domain::ports::CatalogRepository;
use crate::{Result, StorageError};

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS datasets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        fqn TEXT NOT NULL UNIQUE,
        connection_name TEXT NOT NULL,
        database_name TEXT NOT NULL,
        schema_name TEXT NOT NULL,
        table_name TEXT NOT NULL,
        source_system TEXT NOT NULL DEFAULT 'Other',
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS ix_datasets_connection ON datasets(connection_name);
    CREATE INDEX IF NOT EXISTS ix_datasets_database ON datasets(database_name);
    CREATE INDEX IF NOT EXISTS ix_datasets_schema ON datasets(schema_name);
    CREATE INDEX IF NOT EXISTS ix_datasets_table ON datasets(table_name);

    CREATE TABLE IF NOT EXISTS dataset_columns (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        dataset_id INTEGER NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        data_type TEXT NOT NULL DEFAULT 'STRING',
        description TEXT,
        UNIQUE (dataset_id, name)
    );
    CREATE INDEX IF NOT EXISTS ix_column_name ON dataset_columns(name);

    CREATE TABLE IF NOT EXISTS lineage (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        upstream_id INTEGER NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
        downstream_id INTEGER NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        UNIQUE (upstream_id, downstream_id),
        CHECK (upstream_id <> downstream_id)
    );
    CREATE INDEX IF NOT EXISTS ix_lineage_upstream ON lineage(upstream_id);
    CREATE INDEX IF NOT EXISTS ix_lineage_downstream ON lineage(downstream_id);
";

const DATASET_FIELDS: &str = "id, fqn, connection_name, database_name, schema_name, table_name, \
                              source_system, description, created_at, updated_at";

const EDGE_FIELDS: &str = "id, upstream_id, downstream_id, created_at";

/// Upper bound on `?` parameters per `IN (...)` list, well under
/// `SQLITE_MAX_VARIABLE_NUMBER`
const MAX_IDS_PER_QUERY: usize = 500;

/// SQLite-based CatalogRepository implementation
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Open (or create) a SQLite catalog at the given path
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StorageError::config(format!("Cannot open SQLite database {}", path.display()))
                .with_source(e)
        })?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite catalog (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        register_functions(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Row mapping
// ═══════════════════════════════════════════════════════════════════════════

fn map_dataset(row: &Row<'_>) -> rusqlite::Result<Dataset> {
    let source_system: String = row.get(6)?;
    let source_system = source_system
        .parse::<SourceSystem>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    let parts = FqnParts {
        connection_name: row.get(2)?,
        database_name: row.get(3)?,
        schema_name: row.get(4)?,
        table_name: row.get(5)?,
    };
    let fqn: String = row.get(1)?;
    debug_assert_eq!(parts.fqn().as_str(), fqn);

    Ok(Dataset {
        id: row.get(0)?,
        fqn: parts.fqn(),
        connection_name: parts.connection_name,
        database_name: parts.database_name,
        schema_name: parts.schema_name,
        table_name: parts.table_name,
        source_system,
        description: row.get(7)?,
        columns: Vec::new(),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn map_edge(row: &Row<'_>) -> rusqlite::Result<LineageEdge> {
    Ok(LineageEdge {
        id: row.get(0)?,
        upstream_id: row.get(1)?,
        downstream_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// `contains_ci(haystack, needle)`: literal, Unicode case-insensitive substring test
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "contains_ci",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: String = ctx.get(0)?;
            let needle: String = ctx.get(1)?;
            Ok(contains_ignore_case(&haystack, &needle))
        },
    )?;
    Ok(())
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Attach columns (ordered by column id) to each dataset
fn hydrate(conn: &Connection, mut datasets: Vec<Dataset>) -> Result<Vec<Dataset>> {
    if datasets.is_empty() {
        return Ok(datasets);
    }

    let ids: Vec<DatasetId> = datasets.iter().map(|d| d.id).collect();
    let mut by_dataset: HashMap<DatasetId, Vec<Column>> = HashMap::new();
    // A dataset's columns all land in the chunk holding its id, so per-dataset
    // column order survives chunking
    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let sql = format!(
            "SELECT id, dataset_id, name, data_type, description FROM dataset_columns
             WHERE dataset_id IN ({}) ORDER BY id",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok(Column {
                id: row.get(0)?,
                dataset_id: row.get(1)?,
                name: row.get(2)?,
                data_type: row.get(3)?,
                description: row.get(4)?,
            })
        })?;
        for column in rows {
            let column = column?;
            by_dataset.entry(column.dataset_id).or_default().push(column);
        }
    }

    for dataset in &mut datasets {
        dataset.columns = by_dataset.remove(&dataset.id).unwrap_or_default();
    }
    Ok(datasets)
}

fn insert_columns(conn: &Connection, dataset_id: DatasetId, columns: &[NewColumn]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO dataset_columns (dataset_id, name, data_type, description)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for column in columns {
        stmt.execute(params![
            dataset_id,
            &column.name,
            &column.data_type,
            &column.description
        ])?;
    }
    Ok(())
}

fn query_one_dataset(
    conn: &Connection,
    condition: &str,
    value: impl rusqlite::ToSql,
) -> Result<Option<Dataset>> {
    let sql = format!("SELECT {} FROM datasets WHERE {} = ?1", DATASET_FIELDS, condition);
    let dataset = conn
        .query_row(&sql, params![value], map_dataset)
        .optional()?;
    match dataset {
        Some(dataset) => Ok(hydrate(conn, vec![dataset])?.pop()),
        None => Ok(None),
    }
}

fn require_dataset(conn: &Connection, dataset_id: DatasetId) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM datasets WHERE id = ?1)",
        params![dataset_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StorageError::dataset_not_found(dataset_id))
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogStore {
    async fn get_dataset_by_fqn(&self, fqn: &str) -> Result<Option<Dataset>> {
        let conn = self.conn.lock();
        query_one_dataset(&conn, "fqn", fqn)
    }

    async fn get_dataset(&self, id: DatasetId) -> Result<Option<Dataset>> {
        let conn = self.conn.lock();
        query_one_dataset(&conn, "id", id)
    }

    async fn get_datasets_by_ids(&self, ids: &[DatasetId]) -> Result<Vec<Dataset>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let unique: BTreeSet<DatasetId> = ids.iter().copied().collect();
        let unique: Vec<DatasetId> = unique.into_iter().collect();
        let mut datasets = Vec::with_capacity(unique.len());
        for chunk in unique.chunks(MAX_IDS_PER_QUERY) {
            let sql = format!(
                "SELECT {} FROM datasets WHERE id IN ({})",
                DATASET_FIELDS,
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), map_dataset)?;
            for dataset in rows {
                datasets.push(dataset?);
            }
        }
        datasets.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        hydrate(&conn, datasets)
    }

    async fn list_datasets(&self, offset: usize, limit: usize) -> Result<Vec<Dataset>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM datasets ORDER BY fqn LIMIT ?1 OFFSET ?2",
            DATASET_FIELDS
        );
        let mut stmt = conn.prepare(&sql)?;
        let datasets = stmt
            .query_map(params![limit as i64, offset as i64], map_dataset)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        hydrate(&conn, datasets)
    }

    async fn count_datasets(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM datasets", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn create_dataset(&self, dataset: &NewDataset) -> Result<Dataset> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = Utc::now();
        let fqn: Fqn = dataset.fqn();

        tx.execute(
            "INSERT INTO datasets (fqn, connection_name, database_name, schema_name, table_name,
                                   source_system, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                fqn.as_str(),
                &dataset.parts.connection_name,
                &dataset.parts.database_name,
                &dataset.parts.schema_name,
                &dataset.parts.table_name,
                dataset.source_system.as_str(),
                &dataset.description,
                now,
                now
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_columns(&tx, id, &dataset.columns)?;

        let created = query_one_dataset(&tx, "id", id)?
            .ok_or_else(|| StorageError::database(format!("Inserted dataset {} vanished", fqn)))?;
        tx.commit()?;
        Ok(created)
    }

    async fn update_dataset(
        &self,
        dataset_id: DatasetId,
        source_system: Option<SourceSystem>,
        description: Option<&str>,
        columns: Option<&[NewColumn]>,
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE datasets
             SET source_system = COALESCE(?1, source_system),
                 description = COALESCE(?2, description),
                 updated_at = ?3
             WHERE id = ?4",
            params![
                source_system.map(|s| s.as_str()),
                description,
                Utc::now(),
                dataset_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::dataset_not_found(dataset_id));
        }

        if let Some(columns) = columns {
            tx.execute(
                "DELETE FROM dataset_columns WHERE dataset_id = ?1",
                params![dataset_id],
            )?;
            insert_columns(&tx, dataset_id, columns)?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        // Explicit deletes keep the cascade independent of the foreign_keys pragma
        tx.execute(
            "DELETE FROM lineage WHERE upstream_id = ?1 OR downstream_id = ?1",
            params![dataset_id],
        )?;
        tx.execute(
            "DELETE FROM dataset_columns WHERE dataset_id = ?1",
            params![dataset_id],
        )?;
        let deleted = tx.execute("DELETE FROM datasets WHERE id = ?1", params![dataset_id])?;
        if deleted == 0 {
            return Err(StorageError::dataset_not_found(dataset_id));
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_edge(
        &self,
        upstream_id: DatasetId,
        downstream_id: DatasetId,
    ) -> Result<Option<LineageEdge>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM lineage WHERE upstream_id = ?1 AND downstream_id = ?2",
            EDGE_FIELDS
        );
        Ok(conn
            .query_row(&sql, params![upstream_id, downstream_id], map_edge)
            .optional()?)
    }

    async fn list_all_edges(&self) -> Result<Vec<LineageEdge>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM lineage ORDER BY id", EDGE_FIELDS);
        let mut stmt = conn.prepare(&sql)?;
        let edges = stmt
            .query_map([], map_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    async fn list_edges_for_dataset(&self, dataset_id: DatasetId) -> Result<Vec<LineageEdge>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM lineage WHERE upstream_id = ?1 OR downstream_id = ?1 ORDER BY id",
            EDGE_FIELDS
        );
        let mut stmt = conn.prepare(&sql)?;
        let edges = stmt
            .query_map(params![dataset_id], map_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    async fn create_edge(
        &self,
        upstream_id: DatasetId,
        downstream_id: DatasetId,
    ) -> Result<LineageEdge> {
        let conn = self.conn.lock();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO lineage (upstream_id, downstream_id, created_at) VALUES (?1, ?2, ?3)",
            params![upstream_id, downstream_id, created_at],
        )?;
        Ok(LineageEdge {
            id: conn.last_insert_rowid(),
            upstream_id,
            downstream_id,
            created_at,
        })
    }

    async fn delete_edge(&self, upstream_id: DatasetId, downstream_id: DatasetId) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM lineage WHERE upstream_id = ?1 AND downstream_id = ?2",
            params![upstream_id, downstream_id],
        )?;
        Ok(())
    }

    async fn list_columns_matching(&self, substring: &str) -> Result<Vec<ColumnMatch>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT dataset_id, name FROM dataset_columns
             WHERE contains_ci(name, ?1) ORDER BY id",
        )?;
        let matches = stmt
            .query_map(params![substring], |row| {
                Ok(ColumnMatch {
                    dataset_id: row.get(0)?,
                    column_name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(matches)
    }

    async fn list_datasets_matching(
        &self,
        field: SearchField,
        substring: &str,
    ) -> Result<Vec<Dataset>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM datasets WHERE contains_ci({}, ?1) ORDER BY fqn",
            DATASET_FIELDS,
            field.column_name()
        );
        let mut stmt = conn.prepare(&sql)?;
        let datasets = stmt
            .query_map(params![substring], map_dataset)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        hydrate(&conn, datasets)
    }
}
