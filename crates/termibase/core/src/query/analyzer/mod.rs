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

//! Query Analysis
//!
//! Keyword scanning over SQL text. The analyzer is deliberately forgiving:
//! it reads statements a student is still typing and never rejects input.

#[allow(clippy::module_inception)]
pub mod analyzer;
pub mod facts;
mod scanner;

pub use analyzer::QueryAnalyzer;
pub use facts::{JoinInfo, JoinType, QueryFacts, QueryType};

/// Analyzes `query` into a fact sheet.
pub fn analyze(query: &str) -> QueryFacts {
    QueryAnalyzer::new(query).analyze()
}
