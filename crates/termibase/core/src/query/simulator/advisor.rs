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

//! Optimization hints derived from a simulated plan.
//!
//! Each hint comes from a [`SuggestionRule`]. The [`Advisor`] runs its rules in
//! registration order and falls back to a single "well-optimized" note when no
//! rule has anything to say.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::step::{DetailValue, ExecutionStep, StepType};
use crate::query::analyzer::QueryFacts;

pub const DEFAULT_LARGE_RESULT_THRESHOLD: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionKind {
    MissingIndex { table: String },
    UnindexedFilter,
    LargeResult { rows: u64 },
    WellOptimized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub kind: SuggestionKind,
    pub message: String,
}

impl Suggestion {
    pub fn missing_index(table: &str) -> Self {
        Self {
            kind: SuggestionKind::MissingIndex { table: table.to_string() },
            message: format!("Consider creating an index on {table} to avoid full table scan"),
        }
    }

    pub fn unindexed_filter() -> Self {
        Self {
            kind: SuggestionKind::UnindexedFilter,
            message: "Consider adding indexes on columns used in WHERE clause".to_string(),
        }
    }

    pub fn large_result(rows: u64) -> Self {
        Self {
            kind: SuggestionKind::LargeResult { rows },
            message: format!("Large result set ({rows} rows). Consider adding LIMIT or more specific WHERE conditions"),
        }
    }

    pub fn well_optimized() -> Self {
        Self {
            kind: SuggestionKind::WellOptimized,
            message: "Query looks well-optimized!".to_string(),
        }
    }

    pub fn is_well_optimized(&self) -> bool {
        self.kind == SuggestionKind::WellOptimized
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub facts: &'a QueryFacts,
    pub steps: &'a [ExecutionStep],
}

impl<'a> PlanContext<'a> {
    pub fn new(facts: &'a QueryFacts, steps: &'a [ExecutionStep]) -> Self {
        Self { facts, steps }
    }

    pub fn final_rows(&self) -> u64 {
        super::final_rows(self.steps)
    }
}

pub trait SuggestionRule: Send + Sync {
    fn name(&self) -> &str;
    fn applicable(&self, plan: &PlanContext<'_>) -> bool;
    fn apply(&self, plan: &PlanContext<'_>) -> Vec<Suggestion>;
}

/// Full table scans that no index helped with.
pub struct MissingIndexRule;

impl SuggestionRule for MissingIndexRule {
    fn name(&self) -> &str {
        "missing_index"
    }

    fn applicable(&self, plan: &PlanContext<'_>) -> bool {
        plan.steps.iter().any(|step| step.step_type == StepType::TableScan)
    }

    fn apply(&self, plan: &PlanContext<'_>) -> Vec<Suggestion> {
        plan.steps
            .iter()
            .filter(|step| step.step_type == StepType::TableScan)
            .filter(|step| step.detail("index_used") != Some(&DetailValue::Bool(true)))
            .filter_map(|step| step.table())
            .filter(|table| !table.is_empty())
            .map(Suggestion::missing_index)
            .collect()
    }
}

/// A WHERE clause that is evaluated without any index scan.
pub struct UnindexedFilterRule;

impl SuggestionRule for UnindexedFilterRule {
    fn name(&self) -> &str {
        "unindexed_filter"
    }

    fn applicable(&self, plan: &PlanContext<'_>) -> bool {
        plan.facts.has_where()
    }

    fn apply(&self, plan: &PlanContext<'_>) -> Vec<Suggestion> {
        if plan.steps.iter().any(|step| step.step_type == StepType::IndexScan) {
            Vec::new()
        } else {
            vec![Suggestion::unindexed_filter()]
        }
    }
}

pub struct LargeResultRule {
    threshold: u64,
}

impl LargeResultRule {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }
}

impl Default for LargeResultRule {
    fn default() -> Self {
        Self::new(DEFAULT_LARGE_RESULT_THRESHOLD)
    }
}

impl SuggestionRule for LargeResultRule {
    fn name(&self) -> &str {
        "large_result"
    }

    fn applicable(&self, plan: &PlanContext<'_>) -> bool {
        !plan.steps.is_empty()
    }

    fn apply(&self, plan: &PlanContext<'_>) -> Vec<Suggestion> {
        let rows = plan.final_rows();
        if rows > self.threshold { vec![Suggestion::large_result(rows)] } else { Vec::new() }
    }
}

pub struct Advisor {
    rules: Vec<Box<dyn SuggestionRule>>,
}

impl Advisor {
    /// An advisor with no rules. It always reports the plan as well-optimized.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules(large_result_threshold: u64) -> Self {
        let mut advisor = Self::new();
        advisor.add_rule(Box::new(MissingIndexRule));
        advisor.add_rule(Box::new(UnindexedFilterRule));
        advisor.add_rule(Box::new(LargeResultRule::new(large_result_threshold)));
        advisor
    }

    pub fn add_rule(&mut self, rule: Box<dyn SuggestionRule>) {
        self.rules.push(rule);
    }

    pub fn suggest(&self, facts: &QueryFacts, steps: &[ExecutionStep]) -> Vec<Suggestion> {
        let plan = PlanContext::new(facts, steps);
        let mut suggestions = Vec::new();

        for rule in &self.rules {
            if rule.applicable(&plan) {
                let found = rule.apply(&plan);
                if !found.is_empty() {
                    tracing::trace!(rule = rule.name(), count = found.len(), "Rule produced suggestions");
                }
                suggestions.extend(found);
            }
        }

        if suggestions.is_empty() {
            suggestions.push(Suggestion::well_optimized());
        }
        suggestions
    }
}

impl Default for Advisor {
    fn default() -> Self {
        Self::with_default_rules(DEFAULT_LARGE_RESULT_THRESHOLD)
    }
}
