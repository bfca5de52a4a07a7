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

//! # Query Processing Module
//!
//! This module turns SQL text into an illustrative execution plan.
//!
//! ## Modules
//!
//! - `analyzer`: fail-soft structural analysis of a single SQL statement
//! - `simulator`: heuristic plan synthesis and optimization advice
//!
//! ## Architecture
//!
//! The pipeline follows this flow:
//! 1. **Analysis**: extract tables, columns, predicates, joins and clauses
//! 2. **Simulation**: emit typed, cost-annotated steps per query type
//! 3. **Advice**: inspect the steps and suggest indexes or narrower queries
//!
//! Neither stage validates SQL. Malformed input yields shorter or emptier
//! results, never an error.

pub mod analyzer;
pub mod simulator;
