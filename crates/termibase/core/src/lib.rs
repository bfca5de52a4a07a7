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

//! # TermiBase Core
//!
//! Query analysis and execution-plan simulation for the TermiBase SQL
//! learning console.
//!
//! ## Modules
//!
//! - `query`: text analysis of SQL statements and the plan simulator
//! - `storage`: the catalog interface and the embedded SQLite engine
//! - `demo`: sample schema, data and teaching queries
//!
//! ## Pipeline
//!
//! 1. **Analysis**: a raw SQL string becomes a [`QueryFacts`] sheet
//! 2. **Simulation**: facts plus live catalog signals become [`ExecutionStep`]s
//! 3. **Advice**: steps are inspected for optimization [`Suggestion`]s

pub mod demo;
pub mod query;
pub mod storage;

pub use query::{
    analyzer::{JoinInfo, JoinType, QueryAnalyzer, QueryFacts, QueryType, analyze},
    simulator::{
        Advisor, DetailValue, ExecutionSimulator, ExecutionStep, PlanReport, SimulatorConfig, StepType, Suggestion, SuggestionKind, SuggestionRule, final_rows,
        total_cost,
    },
};
pub use storage::{Catalog, ColumnInfo, IndexInfo, SqliteStorage, StorageError, StorageResult, Value};
