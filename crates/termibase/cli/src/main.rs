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


//! TermiBase CLI
//!
//! Terminal playground for learning how SQL statements are executed.

mod commands;
mod config;
mod render;
mod repl;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{Level, error};

use crate::config::TermibaseConfig;

#[derive(Parser, Debug)]
#[command(name = "termibase")]
#[command(about = "TermiBase - a terminal-native database learning playground")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides $TERMIBASE_DB_PATH)
    #[arg(long, short = 'd', global = true)]
    db_path: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Starts the REPL when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the sandbox database and load the demo data
    Init,
    /// Show the structural facts extracted from a query
    Analyze {
        /// SQL query to analyze
        query: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the simulated execution plan for a query without running it
    Explain {
        /// SQL query to explain
        query: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Execute a query, showing its plan first
    Run {
        /// SQL query to execute
        query: String,
        /// Skip the execution plan
        #[arg(long)]
        no_explain: bool,
    },
    /// Walk through the educational demo queries
    Demo {
        /// Demo set to run (basics, joins, indexes, advanced)
        name: Option<String>,
    },
    /// List tables in the database
    Tables,
    /// Show column definitions
    Schema {
        /// Only this table
        table: Option<String>,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Launch the interactive SQL shell
    Repl {
        /// Show the execution plan for each statement
        #[arg(long, short = 'e')]
        explain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write the effective configuration to a file
    Save { path: PathBuf },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_target(false).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TermibaseConfig::resolve_config(cli.config, cli.db_path)?;

    match cli.command {
        Some(Commands::Init) => commands::handle_init(&config),
        Some(Commands::Analyze { query, json }) => commands::handle_analyze(&query, json),
        Some(Commands::Explain { query, json }) => commands::handle_explain(&config, &query, json),
        Some(Commands::Run { query, no_explain }) => commands::handle_run(&config, &query, !no_explain),
        Some(Commands::Demo { name }) => commands::handle_demo(&config, name.as_deref()),
        Some(Commands::Tables) => commands::handle_tables(&config),
        Some(Commands::Schema { table }) => commands::handle_schema(&config, table.as_deref()),
        Some(Commands::Config { command: ConfigCommands::Show }) => commands::handle_config_show(&config),
        Some(Commands::Config { command: ConfigCommands::Save { path } }) => commands::handle_config_save(&config, &path),
        Some(Commands::Repl { explain }) => commands::handle_repl(&config, explain),
        None => commands::handle_repl(&config, false),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("Command failed: {e:#}");
        process::exit(1);
    }
}
