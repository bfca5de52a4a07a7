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


//! Line-based interactive shell.

use anyhow::Result;
use std::io::{BufRead, ErrorKind, Write};
use termibase_core::{Catalog, ExecutionSimulator, SqliteStorage, analyze};
use tracing::debug;

use crate::render;

const PROMPT: &str = "termibase> ";

const EXAMPLES: [(&str, &str); 4] = [
    ("SELECT * FROM users LIMIT 5", "View first 5 users"),
    ("SELECT name, age FROM users WHERE age > 28", "Filter users by age"),
    ("SELECT city, COUNT(*) FROM users GROUP BY city", "Count users by city"),
    ("SELECT u.name, o.amount FROM users u JOIN orders o ON u.id = o.user_id", "Join users with orders"),
];

/// State carried between REPL lines.
pub struct Session<'a> {
    storage: &'a SqliteStorage,
    simulator: ExecutionSimulator<&'a SqliteStorage>,
    show_explain: bool,
    max_result_rows: usize,
    statements_run: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

impl<'a> Session<'a> {
    pub fn new(storage: &'a SqliteStorage, simulator: ExecutionSimulator<&'a SqliteStorage>, show_explain: bool, max_result_rows: usize) -> Self {
        Self {
            storage,
            simulator,
            show_explain,
            max_result_rows,
            statements_run: 0,
        }
    }

    pub fn show_explain(&self) -> bool {
        self.show_explain
    }

    pub fn statements_run(&self) -> usize {
        self.statements_run
    }

    /// Reads lines until `.exit`, `.quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        writeln!(out, "TermiBase - SQL learning playground")?;
        writeln!(out, "Type SQL to run it, .help for commands, .exit to quit.")?;

        let mut line = String::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            match input.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    writeln!(out)?;
                    writeln!(out, "Interrupted. Use .exit to quit.")?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if self.handle_line(line.trim(), out)? == Flow::Exit {
                break;
            }
        }

        writeln!(out, "Goodbye!")?;
        Ok(())
    }

    fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if let Some(command) = line.strip_prefix('.') {
            return self.handle_command(command.trim(), out);
        }

        self.run_statement(line, out)?;
        Ok(Flow::Continue)
    }

    fn handle_command<W: Write>(&mut self, command: &str, out: &mut W) -> Result<Flow> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();

        match name.as_str() {
            "exit" | "quit" => return Ok(Flow::Exit),
            "help" => write_help(out)?,
            "explain" => {
                self.show_explain = !self.show_explain;
                writeln!(out, "Execution plan display: {}", if self.show_explain { "ON" } else { "OFF" })?;
            }
            "tables" => {
                let tables = self.storage.list_tables()?;
                if tables.is_empty() {
                    writeln!(out, "No tables found.")?;
                } else {
                    writeln!(out, "Tables:")?;
                    for table in tables {
                        writeln!(out, "  {table}")?;
                    }
                }
            }
            "schema" => {
                let tables = match parts.next() {
                    Some(table) => vec![table.to_string()],
                    None => self.storage.list_tables()?,
                };
                if tables.is_empty() {
                    writeln!(out, "No tables found.")?;
                }
                for table in tables {
                    match self.storage.table_columns(&table) {
                        Ok(columns) => render::write_schema(out, &table, &columns)?,
                        Err(e) => writeln!(out, "Error: {e}")?,
                    }
                }
            }
            "examples" => {
                writeln!(out, "Example Queries:")?;
                for (i, (query, description)) in EXAMPLES.iter().enumerate() {
                    writeln!(out, "  {}. {query}", i + 1)?;
                    writeln!(out, "     {description}")?;
                }
            }
            other => {
                writeln!(out, "Unknown command: .{other}")?;
                writeln!(out, "Type .help for available commands")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn run_statement<W: Write>(&mut self, sql: &str, out: &mut W) -> Result<()> {
        self.statements_run += 1;

        if self.show_explain {
            let report = self.simulator.explain(sql);
            render::write_facts(out, &report.facts)?;
            writeln!(out)?;
            render::write_report(out, &report)?;
            writeln!(out)?;
        } else {
            render::write_facts(out, &analyze(sql))?;
            writeln!(out)?;
        }

        match self.storage.execute(sql, &[]) {
            Ok(output) => {
                debug!(columns = output.columns.len(), rows = output.rows.len(), "Statement finished");
                render::write_results(out, &output, self.max_result_rows)?;
            }
            Err(e) => {
                debug!("Statement failed: {e}");
                writeln!(out, "Error: {e}")?;
            }
        }
        Ok(())
    }
}

fn write_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "TermiBase Commands")?;
    writeln!(out, "  .help           Show this help")?;
    writeln!(out, "  .explain        Toggle execution plan display")?;
    writeln!(out, "  .tables         List all tables")?;
    writeln!(out, "  .schema [TABLE] Show table schemas")?;
    writeln!(out, "  .examples       Show example queries")?;
    writeln!(out, "  .exit, .quit    Exit the shell")?;
    writeln!(out, "Any other input is run as SQL.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use termibase_core::demo;

    fn run_script(script: &str, explain: bool) -> (String, usize, bool) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        demo::seed(&storage).unwrap();
        let mut session = Session::new(&storage, ExecutionSimulator::new(&storage), explain, 100);

        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        session.run(&mut input, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), session.statements_run(), session.show_explain())
    }

    #[test]
    fn test_quit_exits_cleanly() {
        let (out, statements, _) = run_script(".quit\nSELECT 1\n", false);
        assert!(out.ends_with("Goodbye!\n"));
        assert_eq!(statements, 0);
    }

    #[test]
    fn test_statement_runs_until_end_of_input() {
        let (out, statements, _) = run_script("SELECT name FROM users WHERE id = 1\n", false);
        assert!(out.contains("Alice"));
        assert!(!out.contains("Execution Plan"));
        assert_eq!(statements, 1);
    }

    #[test]
    fn test_every_statement_is_annotated() {
        let (out, _, _) = run_script("SELECT name FROM users WHERE id = 1
SELECT * FROM missing_table
", false);
        assert_eq!(out.matches("Query Analysis").count(), 2);
        assert!(out.contains("  Type:      SELECT"));
        assert!(out.contains("  Where:     id = 1"));
        assert!(out.contains("  Tables:    missing_table"));
        assert!(out.find("Query Analysis") < out.find("Alice"));
    }

    #[test]
    fn test_explain_toggle() {
        let (out, _, explain) = run_script(".explain\nSELECT * FROM users WHERE city = 'Boston'\n.exit\n", false);
        assert!(out.contains("Execution plan display: ON"));
        assert!(out.contains("[1] INDEX_SCAN - Scanning index on users"));
        assert!(out.contains("Query looks well-optimized!"));
        assert!(explain);
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let (out, statements, _) = run_script("SELECT * FROM missing_table\nSELECT COUNT(*) FROM orders\n", false);
        assert!(out.contains("Error: "));
        assert!(out.contains("12"));
        assert_eq!(statements, 2);
    }

    #[test]
    fn test_dot_commands() {
        let (out, _, _) = run_script(".tables\n.schema users\n.examples\n.bogus\n.help\n", false);
        assert!(out.contains("Tables:\n  orders\n  users\n"));
        assert!(out.contains("Table: users"));
        assert!(out.contains("Example Queries:"));
        assert!(out.contains("Unknown command: .bogus"));
        assert!(out.contains("TermiBase Commands"));
    }
}
