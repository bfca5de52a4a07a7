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


//! Subcommand handlers.

use anyhow::{Context, Result, bail};
use std::io::{self, Write};
use std::path::Path;
use termibase_core::{Catalog, ExecutionSimulator, QueryAnalyzer, SqliteStorage, demo};
use tracing::info;

use crate::config::TermibaseConfig;
use crate::render;
use crate::repl::Session;

/// Opens the configured database. A missing file is either seeded with the
/// demo data or reported, depending on `auto_init`.
pub fn open_storage(config: &TermibaseConfig, auto_init: bool) -> Result<SqliteStorage> {
    let path = &config.db_path;
    if !path.exists() {
        if !auto_init {
            bail!("Database not found at {}. Run 'termibase init' first.", path.display());
        }
        info!("Database not found, initializing {}", path.display());
        let storage = SqliteStorage::open(path)?;
        demo::seed(&storage).context("Failed to seed demo data")?;
        return Ok(storage);
    }
    Ok(SqliteStorage::open(path)?)
}

fn build_simulator<'a>(storage: &'a SqliteStorage, config: &TermibaseConfig) -> ExecutionSimulator<&'a SqliteStorage> {
    ExecutionSimulator::with_config(storage, config.simulator.clone())
}

pub fn handle_init(config: &TermibaseConfig) -> Result<()> {
    let path = &config.db_path;
    println!("Initializing TermiBase database...");
    println!("Database path: {}", path.display());

    let storage = SqliteStorage::open(path)?;
    demo::seed(&storage)?;

    println!("Database initialized successfully!");
    println!("Run 'termibase repl' to start the interactive shell.");
    info!("Initialized database {}", path.display());
    Ok(())
}

pub fn handle_analyze(query: &str, json: bool) -> Result<()> {
    let facts = QueryAnalyzer::new(query).analyze();
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&facts)?)?;
    } else {
        render::write_facts(&mut out, &facts)?;
    }
    Ok(())
}

pub fn handle_explain(config: &TermibaseConfig, query: &str, json: bool) -> Result<()> {
    let storage = open_storage(config, false)?;
    let report = build_simulator(&storage, config).explain(query);

    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    render::write_facts(&mut out, &report.facts)?;
    writeln!(out)?;
    render::write_report(&mut out, &report)?;

    // not every statement can be planned by the engine
    match storage.explain_query_plan(query) {
        Ok(lines) if !lines.is_empty() => {
            writeln!(out)?;
            render::write_engine_plan(&mut out, &lines)?;
        }
        Ok(_) => {}
        Err(e) => info!("Engine plan unavailable: {e}"),
    }
    Ok(())
}

pub fn handle_run(config: &TermibaseConfig, query: &str, explain: bool) -> Result<()> {
    let storage = open_storage(config, false)?;
    let mut out = io::stdout().lock();

    if explain {
        let report = build_simulator(&storage, config).explain(query);
        render::write_report(&mut out, &report)?;
        writeln!(out)?;
    }

    let output = storage.execute(query, &[]).with_context(|| format!("Failed to execute: {query}"))?;
    render::write_results(&mut out, &output, config.output.max_result_rows)?;
    info!("Executed query with {} result rows", output.rows.len());
    Ok(())
}

pub fn handle_demo(config: &TermibaseConfig, name: Option<&str>) -> Result<()> {
    let sets = match name {
        Some(name) => match demo::find_demo(name) {
            Some(set) => vec![set],
            None => {
                let available: Vec<&str> = demo::demo_queries().iter().map(|set| set.name).collect();
                bail!("Demo '{name}' not found. Available demos: {}", available.join(", "));
            }
        },
        None => demo::demo_queries(),
    };

    let storage = open_storage(config, true)?;
    let simulator = build_simulator(&storage, config);
    let mut out = io::stdout().lock();

    for set in sets {
        writeln!(out)?;
        render::write_banner(&mut out, &format!("Demo: {}", set.name))?;
        for (i, example) in set.queries.iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "Example {}: {}", i + 1, example.description)?;
            writeln!(out, "  {}", example.query)?;
            writeln!(out)?;

            render::write_report(&mut out, &simulator.explain(example.query))?;
            writeln!(out)?;
            match storage.execute(example.query, &[]) {
                Ok(output) => render::write_results(&mut out, &output, config.output.max_result_rows)?,
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
    }
    Ok(())
}

pub fn handle_tables(config: &TermibaseConfig) -> Result<()> {
    let storage = open_storage(config, false)?;
    let tables = storage.list_tables()?;
    if tables.is_empty() {
        println!("No tables found.");
    } else {
        println!("Tables:");
        for table in &tables {
            println!("  {table} ({} rows)", storage.count_rows(table)?);
        }
    }
    info!("Listed {} tables", tables.len());
    Ok(())
}

pub fn handle_schema(config: &TermibaseConfig, table: Option<&str>) -> Result<()> {
    let storage = open_storage(config, false)?;
    let tables = match table {
        Some(table) => vec![table.to_string()],
        None => storage.list_tables()?,
    };

    let mut out = io::stdout().lock();
    for table in tables {
        let columns = storage.table_columns(&table)?;
        render::write_schema(&mut out, &table, &columns)?;
        let indexes = storage.list_indexes(&table)?;
        if !indexes.is_empty() {
            let names: Vec<&str> = indexes.iter().map(|index| index.name.as_str()).collect();
            writeln!(out, "  indexes: {}", names.join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn handle_config_show(config: &TermibaseConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn handle_config_save(config: &TermibaseConfig, path: &Path) -> Result<()> {
    config.save_to_file(path).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

pub fn handle_repl(config: &TermibaseConfig, explain: bool) -> Result<()> {
    let storage = open_storage(config, true)?;
    let mut session = Session::new(
        &storage,
        build_simulator(&storage, config),
        explain || config.repl.explain_by_default,
        config.output.max_result_rows,
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    session.run(&mut input, &mut out)?;
    info!(explain = session.show_explain(), "REPL finished after {} statements", session.statements_run());
    Ok(())
}
