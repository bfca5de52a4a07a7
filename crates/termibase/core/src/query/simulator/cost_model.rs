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

use super::step::StepType;

pub const JOIN_ROWS: u64 = 50;
pub const FILTER_ROWS: u64 = 30;
pub const GROUP_ROWS: u64 = 10;
pub const SORT_ROWS: u64 = 25;
pub const PROJECT_ROWS: u64 = 20;
pub const INSERT_ROWS: u64 = 1;

/// Cost and output cardinality of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepEstimate {
    pub cost: f64,
    pub rows: u64,
}

impl StepEstimate {
    pub fn new(cost: f64, rows: u64) -> Self {
        Self { cost, rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperationCost {
    TableScan { rows: u64 },
    IndexScan { rows: u64 },
    Join,
    Filter,
    Group,
    Sort,
    Limit { limit: u64 },
    Project,
    Insert,
    Update { rows: u64 },
    Delete { rows: u64 },
    Unknown,
}

impl OperationCost {
    pub fn step_type(&self) -> StepType {
        match self {
            OperationCost::TableScan { .. } => StepType::TableScan,
            OperationCost::IndexScan { .. } => StepType::IndexScan,
            OperationCost::Join => StepType::Join,
            OperationCost::Filter => StepType::Filter,
            OperationCost::Group => StepType::Group,
            OperationCost::Sort => StepType::Sort,
            OperationCost::Limit { .. } => StepType::Limit,
            OperationCost::Project => StepType::Project,
            OperationCost::Insert => StepType::Insert,
            OperationCost::Update { .. } => StepType::Update,
            OperationCost::Delete { .. } => StepType::Delete,
            OperationCost::Unknown => StepType::Unknown,
        }
    }
}

/// Fixed per-step weights. Costs are relative and only meant for comparing
/// plans against each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    /// Fraction of a table a filtered scan is assumed to touch.
    pub selectivity: f64,
}

impl CostModel {
    pub fn new() -> Self {
        Self { selectivity: 0.3 }
    }

    pub fn with_selectivity(selectivity: f64) -> Self {
        Self { selectivity }
    }

    pub fn base_cost(step_type: StepType) -> f64 {
        match step_type {
            StepType::TableScan => 1.0,
            StepType::IndexScan => 0.5,
            StepType::Join => 0.8,
            StepType::Filter => 0.3,
            StepType::Group => 0.5,
            StepType::Sort => 0.6,
            StepType::Limit => 0.1,
            StepType::Project => 0.2,
            StepType::Insert => 0.3,
            StepType::Update | StepType::Delete => 0.5,
            StepType::Unknown => 1.0,
        }
    }

    /// Rows left after applying a WHERE clause to `total` rows. Never below one.
    pub fn filtered_rows(&self, total: u64) -> u64 {
        ((total as f64 * self.selectivity) as u64).max(1)
    }

    pub fn estimate_operation_cost(&self, operation: &OperationCost) -> StepEstimate {
        let cost = Self::base_cost(operation.step_type());
        let rows = match operation {
            OperationCost::TableScan { rows } | OperationCost::IndexScan { rows } => *rows,
            OperationCost::Join => JOIN_ROWS,
            OperationCost::Filter => FILTER_ROWS,
            OperationCost::Group => GROUP_ROWS,
            OperationCost::Sort => SORT_ROWS,
            OperationCost::Limit { limit } => *limit,
            OperationCost::Project => PROJECT_ROWS,
            OperationCost::Insert => INSERT_ROWS,
            OperationCost::Update { rows } | OperationCost::Delete { rows } => *rows,
            OperationCost::Unknown => 0,
        };
        StepEstimate::new(cost, rows)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new()
    }
}
