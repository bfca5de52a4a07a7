// TermiBase
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use parking_lot::Mutex;
use rusqlite::{Connection, params_from_iter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Catalog, ColumnInfo, IndexInfo, StorageError, StorageResult, Value, quote_identifier};

/// Rows and metadata produced by one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by a write statement. Zero for queries.
    pub rows_affected: usize,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One line of the engine's own `EXPLAIN QUERY PLAN` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnginePlanLine {
    pub id: i64,
    pub parent: i64,
    pub detail: String,
}

/// Embedded SQLite database behind the console.
///
/// The connection is guarded by a mutex, so a single instance can be shared
/// between threads.
pub struct SqliteStorage {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "SqliteStorage({})", path.display()),
            None => f.write_str("SqliteStorage(:memory:)"),
        }
    }
}

impl SqliteStorage {
    /// Opens (or creates) a database file, creating missing parent directories.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!("Opened database {}", path.display());
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { path, conn: Mutex::new(conn) })
    }

    /// Location of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runs one statement. Statements that return columns yield rows,
    /// everything else reports the number of changed rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> StorageResult<QueryOutput> {
        let conn = self.conn.lock();
        run_statement(&conn, sql, params)
    }

    /// Runs several `;`-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Runs one statement once per parameter set, inside a single transaction.
    pub fn execute_many(&self, sql: &str, params_list: &[Vec<Value>]) -> StorageResult<usize> {
        self.transaction(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut changed = 0;
            for params in params_list {
                changed += stmt.execute(params_from_iter(params.iter()))?;
            }
            Ok(changed)
        })
    }

    /// Runs `f` in a transaction: committed when it returns `Ok`, rolled back
    /// otherwise.
    pub fn transaction<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// The engine's real plan for `sql`, for comparison with the simulation.
    pub fn explain_query_plan(&self, sql: &str) -> StorageResult<Vec<EnginePlanLine>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        let lines = stmt
            .query_map([], |row| {
                Ok(EnginePlanLine {
                    id: row.get(0)?,
                    parent: row.get(1)?,
                    detail: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }
}

fn run_statement(conn: &Connection, sql: &str, params: &[Value]) -> StorageResult<QueryOutput> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

    if columns.is_empty() {
        let rows_affected = stmt.execute(params_from_iter(params.iter()))?;
        debug!(rows_affected, "Executed statement");
        return Ok(QueryOutput {
            columns,
            rows: Vec::new(),
            rows_affected,
        });
    }

    let width = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(Value::from(row.get_ref(idx)?));
        }
        rows.push(values);
    }

    debug!(rows = rows.len(), "Executed query");
    Ok(QueryOutput {
        columns,
        rows,
        rows_affected: 0,
    })
}

impl Catalog for SqliteStorage {
    fn count_rows(&self, table: &str) -> StorageResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote_identifier(table)), [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn list_indexes(&self, table: &str) -> StorageResult<Vec<IndexInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", quote_identifier(table)))?;
        let indexes = stmt
            .query_map([], |row| {
                Ok(IndexInfo {
                    name: row.get(1)?,
                    unique: row.get::<_, i64>(2)? != 0,
                    origin: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(indexes)
    }

    fn list_tables(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")?;
        let tables = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
        Ok(tables)
    }

    fn table_columns(&self, table: &str) -> StorageResult<Vec<ColumnInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
        let columns = stmt
            .query_map([], |row| {
                let data_type: Option<String> = row.get(2)?;
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    data_type: data_type.filter(|t| !t.is_empty()).unwrap_or_else(|| "TEXT".to_string()),
                    nullable: row.get::<_, i64>(3)? == 0,
                    primary_key: row.get::<_, i64>(5)? > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }
}
