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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement class, taken from the first significant keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    #[default]
    Unknown,
}

impl QueryType {
    /// Classifies a leading keyword. Anything unrecognized is `Unknown`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => QueryType::Select,
            "INSERT" => QueryType::Insert,
            "UPDATE" => QueryType::Update,
            "DELETE" => QueryType::Delete,
            "CREATE" => QueryType::Create,
            "DROP" => QueryType::Drop,
            "ALTER" => QueryType::Alter,
            _ => QueryType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
            QueryType::Update => "UPDATE",
            QueryType::Delete => "DELETE",
            QueryType::Create => "CREATE",
            QueryType::Drop => "DROP",
            QueryType::Alter => "ALTER",
            QueryType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
}

impl JoinType {
    /// Maps the word in front of `JOIN`. No qualifier means an inner join.
    pub fn from_qualifier(qualifier: Option<&str>) -> Self {
        match qualifier.map(|q| q.to_ascii_uppercase()).as_deref() {
            Some("LEFT") => JoinType::Left,
            Some("RIGHT") => JoinType::Right,
            Some("FULL") => JoinType::Full,
            Some("OUTER") => JoinType::Outer,
            Some("CROSS") => JoinType::Cross,
            Some("NATURAL") => JoinType::Natural,
            _ => JoinType::Inner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
            JoinType::Outer => "OUTER",
            JoinType::Cross => "CROSS",
            JoinType::Natural => "NATURAL",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinInfo {
    pub join_type: JoinType,
    pub table: String,
}

impl JoinInfo {
    pub fn new(join_type: JoinType, table: impl Into<String>) -> Self {
        Self { join_type, table: table.into() }
    }
}

/// Structural facts extracted from the text of one SQL statement.
///
/// Facts are a pure function of the input text: analyzing the same string
/// twice yields equal values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFacts {
    pub query_type: QueryType,
    /// Lowercase, sorted and deduplicated.
    pub tables: Vec<String>,
    /// `["*"]` when every column is selected.
    pub columns: Vec<String>,
    pub where_conditions: Vec<String>,
    pub has_joins: bool,
    pub joins: Vec<JoinInfo>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    /// Table written by INSERT, UPDATE or DELETE.
    pub target: Option<String>,
}

impl QueryFacts {
    pub fn selects_all_columns(&self) -> bool {
        self.columns.len() == 1 && self.columns[0] == "*"
    }

    pub fn has_where(&self) -> bool {
        !self.where_conditions.is_empty()
    }

    /// The table a write statement operates on, falling back to the first
    /// referenced table.
    pub fn primary_table(&self) -> Option<&str> {
        self.target.as_deref().or_else(|| self.tables.first().map(String::as_str))
    }
}
