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
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    TableScan,
    IndexScan,
    Join,
    Filter,
    Group,
    Sort,
    Limit,
    Project,
    Insert,
    Update,
    Delete,
    Unknown,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::TableScan => "TABLE_SCAN",
            StepType::IndexScan => "INDEX_SCAN",
            StepType::Join => "JOIN",
            StepType::Filter => "FILTER",
            StepType::Group => "GROUP",
            StepType::Sort => "SORT",
            StepType::Limit => "LIMIT",
            StepType::Project => "PROJECT",
            StepType::Insert => "INSERT",
            StepType::Update => "UPDATE",
            StepType::Delete => "DELETE",
            StepType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value in a step's detail map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Bool(bool),
    Integer(u64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Bool(v) => write!(f, "{v}"),
            DetailValue::Integer(v) => write!(f, "{v}"),
            DetailValue::Text(v) => f.write_str(v),
            DetailValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        DetailValue::Bool(value)
    }
}

impl From<u64> for DetailValue {
    fn from(value: u64) -> Self {
        DetailValue::Integer(value)
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

impl From<Vec<String>> for DetailValue {
    fn from(value: Vec<String>) -> Self {
        DetailValue::List(value)
    }
}

/// One stage of a simulated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_type: StepType,
    pub description: String,
    pub cost: f64,
    pub rows_processed: u64,
    pub details: BTreeMap<String, DetailValue>,
}

impl ExecutionStep {
    pub fn new(step_type: StepType, description: impl Into<String>, cost: f64, rows_processed: u64) -> Self {
        Self {
            step_type,
            description: description.into(),
            cost,
            rows_processed,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&DetailValue> {
        self.details.get(key)
    }

    /// The `table` detail, when the step works on a single table.
    pub fn table(&self) -> Option<&str> {
        match self.details.get("table") {
            Some(DetailValue::Text(table)) => Some(table),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_names() {
        assert_eq!(StepType::TableScan.as_str(), "TABLE_SCAN");
        assert_eq!(StepType::IndexScan.to_string(), "INDEX_SCAN");
        assert_eq!(serde_json::to_string(&StepType::TableScan).unwrap(), "\"TABLE_SCAN\"");
    }

    #[test]
    fn test_step_details() {
        let step = ExecutionStep::new(StepType::TableScan, "Scanning table users", 1.0, 8)
            .with_detail("table", "users")
            .with_detail("index_used", false);

        assert_eq!(step.table(), Some("users"));
        assert_eq!(step.detail("index_used"), Some(&DetailValue::Bool(false)));

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step_type"], "TABLE_SCAN");
        assert_eq!(json["details"]["index_used"], false);
        assert_eq!(json["details"]["table"], "users");
    }

    #[test]
    fn test_detail_display() {
        let list = DetailValue::from(vec!["age > 25".to_string(), "city = 'Boston'".to_string()]);
        assert_eq!(list.to_string(), "[age > 25, city = 'Boston']");
        assert_eq!(DetailValue::from(10u64).to_string(), "10");
    }
}
