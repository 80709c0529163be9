use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use querydeck::cli;
use querydeck::config;
use querydeck::params::DateOverrides;

#[derive(Debug, Parser)]
#[command(name = "querydeck")]
#[command(about = "Run catalog queries against an analytics backend and chart the results")]
struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pick and run queries from the catalog at a prompt (default)
    Interactive,
    /// Check that the backend is reachable
    Health,
    /// List the query catalog
    List {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Run one query and render its result
    Run {
        /// Query id from the catalog
        id: String,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        start_month: Option<String>,
        #[arg(long)]
        end_month: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Also print the raw result JSON
        #[arg(long)]
        raw: bool,
    },
    /// Snapshot the catalog and every query result as JSON files
    Export {
        /// Output directory
        #[arg(long, default_value = "querydeck-export")]
        out: PathBuf,
    },
    /// Show recent query runs
    History {
        /// Number of runs to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config to ~/.querydeck/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `api.base_url http://localhost:8000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    if !cfg.display.color {
        colored::control::set_override(false);
    }

    match app.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => cli::run_interactive(&cfg),
        Commands::Health => cli::run_health(&cfg),
        Commands::List { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_list(&cfg, fmt)
        }
        Commands::Run {
            id,
            start_date,
            end_date,
            start_month,
            end_month,
            format,
            raw,
        } => {
            let overrides = DateOverrides {
                start_date,
                end_date,
                start_month,
                end_month,
            };
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_query(&cfg, &id, &overrides, fmt, raw)
        }
        Commands::Export { out } => cli::run_export(&cfg, &out),
        Commands::History { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
