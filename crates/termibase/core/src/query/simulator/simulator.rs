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
use tracing::debug;

use super::advisor::{Advisor, DEFAULT_LARGE_RESULT_THRESHOLD, Suggestion};
use super::cost_model::{CostModel, OperationCost};
use super::step::ExecutionStep;
use super::{PlanReport, final_rows, total_cost};
use crate::query::analyzer::{QueryFacts, QueryType, analyze};
use crate::storage::Catalog;

pub const DEFAULT_ROW_ESTIMATE: u64 = 100;
pub const DEFAULT_INDEX_SELECTIVITY: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Row count assumed when the catalog cannot count a table.
    pub default_row_estimate: u64,
    pub index_selectivity: f64,
    pub large_result_threshold: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            default_row_estimate: DEFAULT_ROW_ESTIMATE,
            index_selectivity: DEFAULT_INDEX_SELECTIVITY,
            large_result_threshold: DEFAULT_LARGE_RESULT_THRESHOLD,
        }
    }
}

/// Builds an illustrative plan for a query from its text and a few catalog
/// lookups. Never fails: catalog errors fall back to defaults.
pub struct ExecutionSimulator<C> {
    catalog: C,
    config: SimulatorConfig,
    cost_model: CostModel,
    advisor: Advisor,
}

impl<C: Catalog> ExecutionSimulator<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, SimulatorConfig::default())
    }

    pub fn with_config(catalog: C, config: SimulatorConfig) -> Self {
        Self {
            catalog,
            cost_model: CostModel::with_selectivity(config.index_selectivity),
            advisor: Advisor::with_default_rules(config.large_result_threshold),
            config,
        }
    }

    /// Replaces the suggestion rules used by [`explain`](Self::explain).
    pub fn with_advisor(mut self, advisor: Advisor) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn simulate(&self, query: &str) -> Vec<ExecutionStep> {
        self.simulate_facts(&analyze(query))
    }

    pub fn simulate_facts(&self, facts: &QueryFacts) -> Vec<ExecutionStep> {
        match facts.query_type {
            QueryType::Select => self.simulate_select(facts),
            QueryType::Insert => self.simulate_insert(facts),
            QueryType::Update | QueryType::Delete => self.simulate_write(facts),
            other => vec![self.step(OperationCost::Unknown, format!("Executing {other} query"))],
        }
    }

    pub fn suggest(&self, facts: &QueryFacts, steps: &[ExecutionStep]) -> Vec<Suggestion> {
        self.advisor.suggest(facts, steps)
    }

    /// Analysis, simulated plan, totals and suggestions in one report.
    pub fn explain(&self, query: &str) -> PlanReport {
        let facts = analyze(query);
        let steps = self.simulate_facts(&facts);
        let suggestions = self.suggest(&facts, &steps);

        PlanReport {
            query: query.trim().to_string(),
            total_cost: total_cost(&steps),
            final_rows: final_rows(&steps),
            facts,
            steps,
            suggestions,
        }
    }

    fn simulate_select(&self, facts: &QueryFacts) -> Vec<ExecutionStep> {
        let mut steps = Vec::new();
        let filtered = facts.has_where();

        for table in &facts.tables {
            let use_index = filtered && self.has_index(table);
            let step = if use_index {
                let rows = self.estimate_rows(table, true);
                self.step(OperationCost::IndexScan { rows }, format!("Scanning index on {table}"))
            } else {
                let rows = self.estimate_rows(table, false);
                self.step(OperationCost::TableScan { rows }, format!("Scanning table {table}"))
            };
            steps.push(step.with_detail("table", table.as_str()).with_detail("index_used", use_index));
        }

        if facts.has_joins {
            for join in &facts.joins {
                steps.push(
                    self.step(OperationCost::Join, format!("Performing {} JOIN with {}", join.join_type, join.table))
                        .with_detail("join_type", join.join_type.as_str())
                        .with_detail("table", join.table.as_str()),
                );
            }
        }

        if filtered {
            steps.push(
                self.step(OperationCost::Filter, format!("Applying WHERE filter: {}", facts.where_conditions.join(", ")))
                    .with_detail("conditions", facts.where_conditions.clone()),
            );
        }

        if !facts.group_by.is_empty() {
            steps.push(self.step(OperationCost::Group, format!("Grouping by: {}", facts.group_by.join(", "))).with_detail("columns", facts.group_by.clone()));
        }

        if !facts.order_by.is_empty() {
            steps.push(self.step(OperationCost::Sort, format!("Sorting by: {}", facts.order_by.join(", "))).with_detail("columns", facts.order_by.clone()));
        }

        if let Some(limit) = facts.limit {
            steps.push(self.step(OperationCost::Limit { limit }, format!("Applying LIMIT {limit}")).with_detail("limit", limit));
        }

        let description = if facts.selects_all_columns() {
            "Projecting all columns".to_string()
        } else if facts.columns.is_empty() {
            "Projecting columns: *".to_string()
        } else {
            format!("Projecting columns: {}", facts.columns.join(", "))
        };
        steps.push(self.step(OperationCost::Project, description).with_detail("columns", facts.columns.clone()));

        steps
    }

    fn simulate_insert(&self, facts: &QueryFacts) -> Vec<ExecutionStep> {
        match facts.primary_table() {
            Some(table) => vec![self.step(OperationCost::Insert, format!("Inserting row into {table}")).with_detail("table", table)],
            None => Vec::new(),
        }
    }

    fn simulate_write(&self, facts: &QueryFacts) -> Vec<ExecutionStep> {
        let Some(table) = facts.primary_table() else {
            return Vec::new();
        };

        let filtered = facts.has_where();
        let scanned = self.estimate_rows(table, filtered);
        let mut steps = vec![
            self.step(OperationCost::TableScan { rows: scanned }, format!("Scanning table {table} for matching rows"))
                .with_detail("table", table)
                .with_detail("index_used", false),
        ];

        if filtered {
            steps.push(
                self.step(OperationCost::Filter, format!("Filtering rows: {}", facts.where_conditions.join(", ")))
                    .with_detail("conditions", facts.where_conditions.clone()),
            );
        }

        // Writes report the filter estimate even without a WHERE clause.
        let affected = self.cost_model.estimate_operation_cost(&OperationCost::Filter).rows;

        let step = if facts.query_type == QueryType::Update {
            self.step(OperationCost::Update { rows: affected }, format!("Updating matching rows in {table}"))
        } else {
            self.step(OperationCost::Delete { rows: affected }, format!("Deleting matching rows from {table}"))
        };
        steps.push(step.with_detail("table", table));

        steps
    }

    fn step(&self, operation: OperationCost, description: String) -> ExecutionStep {
        let estimate = self.cost_model.estimate_operation_cost(&operation);
        ExecutionStep::new(operation.step_type(), description, estimate.cost, estimate.rows)
    }

    fn has_index(&self, table: &str) -> bool {
        match self.catalog.list_indexes(table) {
            Ok(indexes) => !indexes.is_empty(),
            Err(e) => {
                debug!(table, error = %e, "Index lookup failed, assuming no index");
                false
            }
        }
    }

    fn estimate_rows(&self, table: &str, filtered: bool) -> u64 {
        match self.catalog.count_rows(table) {
            Ok(total) if filtered => self.cost_model.filtered_rows(total),
            Ok(total) => total,
            Err(e) => {
                debug!(table, error = %e, "Row count failed, using default estimate");
                self.config.default_row_estimate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::simulator::{DetailValue, StepType, SuggestionKind};
    use crate::storage::{IndexInfo, MockCatalog, StorageError};

    fn index(name: &str) -> IndexInfo {
        IndexInfo {
            name: name.to_string(),
            unique: false,
            origin: "c".to_string(),
        }
    }

    /// `users` has 8 rows and an index, `orders` has 12 rows and none.
    fn demo_catalog() -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog.expect_count_rows().returning(|table| match table {
            "users" => Ok(8),
            "orders" => Ok(12),
            other => Err(StorageError::TableNotFound(other.to_string())),
        });
        catalog.expect_list_indexes().returning(|table| match table {
            "users" => Ok(vec![index("idx_users_city")]),
            _ => Ok(Vec::new()),
        });
        catalog
    }

    fn step_types(steps: &[ExecutionStep]) -> Vec<StepType> {
        steps.iter().map(|s| s.step_type).collect()
    }

    #[test]
    fn test_indexed_filter_uses_index_scan() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate("SELECT * FROM users WHERE age > 25");

        assert_eq!(step_types(&steps), vec![StepType::IndexScan, StepType::Filter, StepType::Project]);
        assert_eq!(steps[0].rows_processed, 2);
        assert_eq!(steps[0].cost, 0.5);
        assert_eq!(steps[0].detail("index_used"), Some(&DetailValue::Bool(true)));
        assert_eq!(steps[1].rows_processed, 30);
        assert_eq!(steps[2].description, "Projecting all columns");
    }

    #[test]
    fn test_unfiltered_select_scans_table() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate("SELECT name, city FROM users");

        assert_eq!(step_types(&steps), vec![StepType::TableScan, StepType::Project]);
        assert_eq!(steps[0].rows_processed, 8);
        assert_eq!(steps[0].cost, 1.0);
        assert_eq!(steps[1].description, "Projecting columns: name, city");
    }

    #[test]
    fn test_full_select_pipeline_order() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate(
            "SELECT u.city, COUNT(*) FROM users u LEFT JOIN orders o ON u.id = o.user_id \
             WHERE o.amount > 100 GROUP BY u.city ORDER BY u.city LIMIT 3",
        );

        assert_eq!(
            step_types(&steps),
            vec![
                StepType::TableScan,
                StepType::IndexScan,
                StepType::Join,
                StepType::Filter,
                StepType::Group,
                StepType::Sort,
                StepType::Limit,
                StepType::Project,
            ]
        );
        assert_eq!(steps[0].table(), Some("orders"));
        assert_eq!(steps[1].table(), Some("users"));
        assert_eq!(steps[2].description, "Performing LEFT JOIN with orders");
        assert_eq!(steps[6].rows_processed, 3);
        assert!((total_cost(&steps) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_limit_rows_match_limit() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate("SELECT * FROM orders LIMIT 7");
        let limit = steps.iter().find(|s| s.step_type == StepType::Limit).unwrap();
        assert_eq!(limit.rows_processed, 7);
        assert_eq!(limit.detail("limit"), Some(&DetailValue::Integer(7)));
    }

    #[test]
    fn test_insert_is_single_step() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate("INSERT INTO users (name) VALUES ('x')");
        assert_eq!(step_types(&steps), vec![StepType::Insert]);
        assert_eq!(steps[0].rows_processed, 1);
        assert_eq!(steps[0].table(), Some("users"));
    }

    #[test]
    fn test_update_with_filter() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate("UPDATE orders SET amount = 0 WHERE id = 3");
        assert_eq!(step_types(&steps), vec![StepType::TableScan, StepType::Filter, StepType::Update]);
        assert_eq!(steps[0].rows_processed, 3);
        assert_eq!(steps[2].rows_processed, 30);
        assert_eq!(steps[2].cost, 0.5);
        assert_eq!(steps[2].description, "Updating matching rows in orders");
    }

    #[test]
    fn test_delete_without_filter_uses_filter_estimate() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let steps = simulator.simulate("DELETE FROM orders");
        assert_eq!(step_types(&steps), vec![StepType::TableScan, StepType::Delete]);
        assert_eq!(steps[0].rows_processed, 12);
        assert_eq!(steps[1].rows_processed, 30);
    }

    #[test]
    fn test_unfiltered_delete_on_large_table() {
        let mut catalog = MockCatalog::new();
        catalog.expect_count_rows().returning(|_| Ok(5000));
        catalog.expect_list_indexes().returning(|_| Ok(Vec::new()));

        let simulator = ExecutionSimulator::new(catalog);
        let report = simulator.explain("DELETE FROM events");
        assert_eq!(step_types(&report.steps), vec![StepType::TableScan, StepType::Delete]);
        assert_eq!(report.steps[0].rows_processed, 5000);
        assert_eq!(report.final_rows, 30);
        let kinds: Vec<_> = report.suggestions.iter().map(|s| s.kind.clone()).collect();
        assert_eq!(kinds, vec![SuggestionKind::MissingIndex { table: "events".to_string() }]);

        let steps = simulator.simulate("UPDATE events SET seen = 1");
        assert_eq!(steps.last().map(|s| s.rows_processed), Some(30));
    }

    #[test]
    fn test_other_statements_are_unknown() {
        let simulator = ExecutionSimulator::new(MockCatalog::new());
        for query in ["CREATE TABLE t (id INTEGER)", "DROP TABLE t", "PRAGMA table_info(t)", ""] {
            let steps = simulator.simulate(query);
            assert_eq!(step_types(&steps), vec![StepType::Unknown], "query: {query}");
            assert_eq!(steps[0].cost, 1.0);
        }
        assert_eq!(simulator.simulate("ALTER TABLE t ADD c TEXT")[0].description, "Executing ALTER query");
    }

    #[test]
    fn test_catalog_failures_fall_back() {
        let mut catalog = MockCatalog::new();
        catalog.expect_count_rows().returning(|t| Err(StorageError::TableNotFound(t.to_string())));
        catalog.expect_list_indexes().returning(|t| Err(StorageError::TableNotFound(t.to_string())));

        let simulator = ExecutionSimulator::new(catalog);
        let steps = simulator.simulate("SELECT * FROM ghosts WHERE id = 1");
        assert_eq!(steps[0].step_type, StepType::TableScan);
        assert_eq!(steps[0].rows_processed, 100);
    }

    #[test]
    fn test_custom_config() {
        let config = SimulatorConfig {
            default_row_estimate: 500,
            index_selectivity: 0.5,
            large_result_threshold: 100,
        };
        let simulator = ExecutionSimulator::with_config(demo_catalog(), config);
        assert_eq!(simulator.simulate("SELECT * FROM users WHERE age > 1")[0].rows_processed, 4);
        assert_eq!(simulator.simulate("SELECT * FROM ghosts")[0].rows_processed, 500);
    }

    #[test]
    fn test_explain_report() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let report = simulator.explain("SELECT * FROM orders WHERE amount > 100;");

        assert_eq!(report.query, "SELECT * FROM orders WHERE amount > 100;");
        assert_eq!(report.facts.tables, vec!["orders"]);
        assert_eq!(report.final_rows, 20);
        assert!((report.total_cost - 1.5).abs() < 1e-9);
        let kinds: Vec<_> = report.suggestions.iter().map(|s| s.kind.clone()).collect();
        assert_eq!(kinds, vec![SuggestionKind::MissingIndex { table: "orders".to_string() }, SuggestionKind::UnindexedFilter]);
    }

    #[test]
    fn test_explain_well_optimized() {
        let simulator = ExecutionSimulator::new(demo_catalog());
        let report = simulator.explain("SELECT name FROM users WHERE city = 'Boston'");
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].message, "Query looks well-optimized!");
    }
}
