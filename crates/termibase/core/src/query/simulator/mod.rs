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


//! Execution Simulation
//!
//! Turns [`QueryFacts`] into an ordered list of [`ExecutionStep`]s with fixed,
//! reproducible costs, then runs the [`Advisor`] over the result. The plan is
//! illustrative and is never handed to a real engine.

pub mod advisor;
pub mod cost_model;
#[allow(clippy::module_inception)]
pub mod simulator;
pub mod step;

use serde::{Deserialize, Serialize};

use crate::query::analyzer::QueryFacts;

pub use advisor::{Advisor, PlanContext, Suggestion, SuggestionKind, SuggestionRule};
pub use cost_model::{CostModel, OperationCost, StepEstimate};
pub use simulator::{ExecutionSimulator, SimulatorConfig};
pub use step::{DetailValue, ExecutionStep, StepType};

/// Everything `explain` produces for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub query: String,
    pub facts: QueryFacts,
    pub steps: Vec<ExecutionStep>,
    pub total_cost: f64,
    pub final_rows: u64,
    pub suggestions: Vec<Suggestion>,
}

pub fn total_cost(steps: &[ExecutionStep]) -> f64 {
    steps.iter().map(|step| step.cost).sum()
}

/// Rows flowing out of the last step, 0 for an empty plan.
pub fn final_rows(steps: &[ExecutionStep]) -> u64 {
    steps.last().map(|step| step.rows_processed).unwrap_or(0)
}
