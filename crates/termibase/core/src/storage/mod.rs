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

//! Storage collaborator
//!
//! The simulator only needs a narrow view of the database: row counts and
//! whether a table has indexes. That view is the [`Catalog`] trait. The
//! embedded SQLite engine behind the console implements it and also runs the
//! actual statements.

pub mod sqlite;
pub mod value;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use sqlite::{EnginePlanLine, QueryOutput, SqliteStorage};
pub use value::Value;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Table not found: {0}")]
    TableNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    /// `c` for CREATE INDEX, `u` for UNIQUE constraints, `pk` for primary keys.
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Schema and cardinality lookups used to drive plan simulation.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog {
    fn count_rows(&self, table: &str) -> StorageResult<u64>;

    /// An empty list means the table has no index.
    fn list_indexes(&self, table: &str) -> StorageResult<Vec<IndexInfo>>;

    fn list_tables(&self) -> StorageResult<Vec<String>>;

    fn table_columns(&self, table: &str) -> StorageResult<Vec<ColumnInfo>>;
}

impl<T: Catalog + ?Sized> Catalog for &T {
    fn count_rows(&self, table: &str) -> StorageResult<u64> {
        (**self).count_rows(table)
    }

    fn list_indexes(&self, table: &str) -> StorageResult<Vec<IndexInfo>> {
        (**self).list_indexes(table)
    }

    fn list_tables(&self) -> StorageResult<Vec<String>> {
        (**self).list_tables()
    }

    fn table_columns(&self, table: &str) -> StorageResult<Vec<ColumnInfo>> {
        (**self).table_columns(table)
    }
}

impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    fn count_rows(&self, table: &str) -> StorageResult<u64> {
        (**self).count_rows(table)
    }

    fn list_indexes(&self, table: &str) -> StorageResult<Vec<IndexInfo>> {
        (**self).list_indexes(table)
    }

    fn list_tables(&self) -> StorageResult<Vec<String>> {
        (**self).list_tables()
    }

    fn table_columns(&self, table: &str) -> StorageResult<Vec<ColumnInfo>> {
        (**self).table_columns(table)
    }
}

/// Quotes an identifier for interpolation into SQL text.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_catalog_through_reference_and_arc() {
        let mut mock = MockCatalog::new();
        mock.expect_count_rows().returning(|_| Ok(42));

        let shared = Arc::new(mock);
        assert_eq!(shared.count_rows("users").unwrap(), 42);
        assert_eq!((&*shared).count_rows("users").unwrap(), 42);
    }

    #[test]
    fn test_storage_error_messages() {
        let err = StorageError::TableNotFound("ghosts".to_string());
        assert_eq!(err.to_string(), "Table not found: ghosts");
    }
}
