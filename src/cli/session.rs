//! Interactive card-picker session.
//!
//! Startup order: date defaults, health check, catalog refresh. After that
//! the operator drives the session from a prompt. A failed refresh or run
//! is printed and the session continues with whatever was on screen.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::api::{DashboardApi, HttpBackend};
use crate::catalog::{self, CatalogView};
use crate::config::QueryDeckConfig;
use crate::health::HealthMonitor;
use crate::params::{DateFields, ParameterToken, defaults};
use crate::render::{RenderSink, TerminalSink};
use crate::runner::{QueryRunner, RunOutcome};

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Activate the card at a 1-based position.
    Select(usize),
    Refresh,
    Set { name: String, value: String },
    ShowDates,
    ToggleJson,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse one line of operator input.
pub fn parse_command(line: &str) -> SessionCommand {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return SessionCommand::Empty;
    };

    if let Ok(n) = head.parse::<usize>() {
        return SessionCommand::Select(n);
    }

    match head.to_ascii_lowercase().as_str() {
        "r" | "refresh" => SessionCommand::Refresh,
        "d" | "dates" => SessionCommand::ShowDates,
        "j" | "json" => SessionCommand::ToggleJson,
        "h" | "help" | "?" => SessionCommand::Help,
        "q" | "quit" | "exit" => SessionCommand::Quit,
        "set" => match (words.next(), words.next()) {
            (Some(name), Some(value)) => SessionCommand::Set {
                name: name.to_string(),
                value: value.to_string(),
            },
            _ => SessionCommand::Unknown(line.to_string()),
        },
        _ => SessionCommand::Unknown(line.to_string()),
    }
}

/// Run the interactive session until the operator quits or stdin closes.
pub fn run_interactive(cfg: &QueryDeckConfig) -> Result<()> {
    let backend = HttpBackend::from_config(&cfg.api);
    let mut sink = TerminalSink::new(cfg.display.show_raw_json, cfg.display.chart_width);

    println!("{}", "querydeck".bold().cyan());
    println!("{}", format!("backend: {}", backend.base_url()).dimmed());

    let mut fields = defaults::defaults_now();

    let mut monitor = HealthMonitor::new();
    monitor.start(&backend, &mut sink);

    let mut runner = QueryRunner::new(backend).with_history(cfg.history.enabled);
    let mut view = CatalogView::new();
    refresh_catalog(&mut view, runner.api(), &mut sink);
    print_dates(&fields);
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", ">".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match parse_command(&line) {
            SessionCommand::Select(n) => {
                let Some(card) = view.card(n).cloned() else {
                    println!("  {}", format!("No card {n}.").yellow());
                    continue;
                };
                match card.activate(&mut runner, &fields, &mut sink) {
                    Ok(RunOutcome::Rendered(_)) => {}
                    Ok(RunOutcome::Stale { token, latest }) => println!(
                        "  {}",
                        format!("discarded stale result #{token} (latest #{latest})").dimmed()
                    ),
                    Err(e) => print_error(&e),
                }
            }
            SessionCommand::Refresh => refresh_catalog(&mut view, runner.api(), &mut sink),
            SessionCommand::Set { name, value } => {
                match fields.set_by_name(&name, value) {
                    Ok(()) => print_dates(&fields),
                    Err(e) => print_error(&e),
                }
            }
            SessionCommand::ShowDates => print_dates(&fields),
            SessionCommand::ToggleJson => {
                let on = sink.toggle_raw_json();
                println!("  raw JSON {}", if on { "on" } else { "off" });
            }
            SessionCommand::Help => print_help(),
            SessionCommand::Quit => break,
            SessionCommand::Empty => {}
            SessionCommand::Unknown(input) => {
                println!("  {} {}", "Unknown command:".yellow(), input);
            }
        }
    }

    Ok(())
}

fn refresh_catalog(view: &mut CatalogView, api: &dyn DashboardApi, sink: &mut dyn RenderSink) {
    match catalog::refresh(api) {
        Ok(queries) => view.render(queries, sink),
        Err(e) => print_error(&e),
    }
}

fn print_dates(fields: &DateFields) {
    println!();
    println!("{}", "Parameters".bold().cyan());
    for token in ParameterToken::ALL {
        println!("  {:<12} {}", token.as_str(), fields.get(token));
    }
}

fn print_help() {
    println!();
    println!(
        "  {}",
        "<n> run card · r refresh · set <param> <date> · dates · json · q quit".dimmed()
    );
}

fn print_error(error: &anyhow::Error) {
    println!("  {} {:#}", "Error:".red().bold(), error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_card_selection() {
        assert_eq!(parse_command("3"), SessionCommand::Select(3));
        assert_eq!(parse_command("  12  "), SessionCommand::Select(12));
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(parse_command("r"), SessionCommand::Refresh);
        assert_eq!(parse_command("REFRESH"), SessionCommand::Refresh);
        assert_eq!(parse_command("dates"), SessionCommand::ShowDates);
        assert_eq!(parse_command("json"), SessionCommand::ToggleJson);
        assert_eq!(parse_command("q"), SessionCommand::Quit);
        assert_eq!(parse_command(""), SessionCommand::Empty);
    }

    #[test]
    fn parses_set_with_two_arguments() {
        assert_eq!(
            parse_command("set start_date 2024-01-01"),
            SessionCommand::Set {
                name: "start_date".to_string(),
                value: "2024-01-01".to_string(),
            }
        );
        assert_eq!(
            parse_command("set start_date"),
            SessionCommand::Unknown("set start_date".to_string())
        );
    }

    #[test]
    fn unknown_input_is_reported_verbatim() {
        assert_eq!(
            parse_command("plot it"),
            SessionCommand::Unknown("plot it".to_string())
        );
    }
}
