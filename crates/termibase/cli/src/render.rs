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


//! Plain-text rendering of reports, results and schema listings.

use std::io::{self, Write};
use termibase_core::storage::{EnginePlanLine, QueryOutput};
use termibase_core::{ColumnInfo, DetailValue, ExecutionStep, PlanReport, QueryFacts, Suggestion, final_rows, total_cost};

const RULE_WIDTH: usize = 60;

/// `TABLE_SCAN` becomes `Table Scan`.
pub fn humanize(step_type: &str) -> String {
    step_type
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn detail_text(value: &DetailValue) -> String {
    match value {
        DetailValue::List(items) => items.join(", "),
        other => other.to_string(),
    }
}

fn or_dash(items: &[String]) -> String {
    if items.is_empty() { "-".to_string() } else { items.join(", ") }
}

pub fn write_facts<W: Write>(out: &mut W, facts: &QueryFacts) -> io::Result<()> {
    writeln!(out, "Query Analysis")?;
    writeln!(out, "  Type:      {}", facts.query_type)?;
    writeln!(out, "  Tables:    {}", or_dash(&facts.tables))?;
    if let Some(target) = &facts.target {
        writeln!(out, "  Target:    {target}")?;
    }
    writeln!(out, "  Columns:   {}", or_dash(&facts.columns))?;
    writeln!(out, "  Where:     {}", or_dash(&facts.where_conditions))?;
    let joins: Vec<String> = facts.joins.iter().map(|j| format!("{} JOIN {}", j.join_type, j.table)).collect();
    writeln!(out, "  Joins:     {}", or_dash(&joins))?;
    writeln!(out, "  Group By:  {}", or_dash(&facts.group_by))?;
    writeln!(out, "  Order By:  {}", or_dash(&facts.order_by))?;
    match facts.limit {
        Some(limit) => writeln!(out, "  Limit:     {limit}"),
        None => writeln!(out, "  Limit:     -"),
    }
}

/// Numbered step list with details and the total estimated cost.
pub fn write_plan<W: Write>(out: &mut W, steps: &[ExecutionStep]) -> io::Result<()> {
    writeln!(out, "Execution Plan")?;
    if steps.is_empty() {
        writeln!(out, "  (no steps)")?;
    }
    for (i, step) in steps.iter().enumerate() {
        writeln!(out, "  [{}] {} - {} (cost: {:.2}, rows: {})", i + 1, step.step_type, step.description, step.cost, step.rows_processed)?;
        for (key, value) in &step.details {
            writeln!(out, "      {key}: {}", detail_text(value))?;
        }
    }
    writeln!(out, "Total Estimated Cost: {:.2}", total_cost(steps))
}

pub fn write_flow<W: Write>(out: &mut W, steps: &[ExecutionStep]) -> io::Result<()> {
    writeln!(out, "Execution Flow")?;
    for (i, step) in steps.iter().enumerate() {
        let last = i + 1 == steps.len();
        let (connector, rail) = if last { ("└", " ") } else { ("│", "│") };
        writeln!(out, "{connector}── {}", humanize(step.step_type.as_str()))?;
        writeln!(out, "{rail}   {}", step.description)?;
        for (key, value) in &step.details {
            writeln!(out, "{rail}   └─ {key}: {}", detail_text(value))?;
        }
    }
    Ok(())
}

pub fn write_totals<W: Write>(out: &mut W, steps: &[ExecutionStep]) -> io::Result<()> {
    writeln!(out, "Total Cost: {:.2} | Final Rows: {}", total_cost(steps), final_rows(steps))
}

pub fn write_suggestions<W: Write>(out: &mut W, suggestions: &[Suggestion]) -> io::Result<()> {
    writeln!(out, "Suggestions")?;
    for suggestion in suggestions {
        writeln!(out, "  - {suggestion}")?;
    }
    Ok(())
}

pub fn write_report<W: Write>(out: &mut W, report: &PlanReport) -> io::Result<()> {
    write_plan(out, &report.steps)?;
    writeln!(out)?;
    write_flow(out, &report.steps)?;
    writeln!(out)?;
    write_totals(out, &report.steps)?;
    writeln!(out)?;
    write_suggestions(out, &report.suggestions)
}

pub fn write_engine_plan<W: Write>(out: &mut W, lines: &[EnginePlanLine]) -> io::Result<()> {
    writeln!(out, "Engine Plan")?;
    for line in lines {
        writeln!(out, "  {:>3} {:>3}  {}", line.id, line.parent, line.detail)?;
    }
    Ok(())
}

/// Rows as a `|`-separated table, at most `limit` of them.
pub fn write_results<W: Write>(out: &mut W, output: &QueryOutput, limit: usize) -> io::Result<()> {
    if output.columns.is_empty() {
        return writeln!(out, "Query executed successfully. {} row(s) affected.", output.rows_affected);
    }
    if output.rows.is_empty() {
        return writeln!(out, "No rows returned.");
    }

    let shown = output.rows.len().min(limit);
    let cells: Vec<Vec<String>> = output.rows[..shown].iter().map(|row| row.iter().map(ToString::to_string).collect()).collect();

    let mut widths: Vec<usize> = output.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "Query Results (showing {shown} of {} rows)", output.rows.len())?;
    write_row(out, &output.columns, &widths)?;
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", separator.join("-+-"))?;
    for row in &cells {
        write_row(out, row, &widths)?;
    }

    if output.rows.len() > shown {
        writeln!(out, "... and {} more rows", output.rows.len() - shown)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let padded: Vec<String> = cells.iter().zip(widths).map(|(cell, &width)| format!("{cell:<width$}")).collect();
    writeln!(out, "{}", padded.join(" | ").trim_end())
}

pub fn write_schema<W: Write>(out: &mut W, table: &str, columns: &[ColumnInfo]) -> io::Result<()> {
    writeln!(out, "Table: {table}")?;
    for column in columns {
        let mut flags = Vec::new();
        if column.primary_key {
            flags.push("PRIMARY KEY");
        }
        flags.push(if column.nullable { "NULL" } else { "NOT NULL" });
        writeln!(out, "  {:<16} {:<10} {}", column.name, column.data_type, flags.join(" "))?;
    }
    Ok(())
}

pub fn write_banner<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "{rule}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{rule}")
}
