//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - fetches EIA data
//! - runs the reshape pipeline
//! - prints reports / writes exports
//! - hands off to the TUI

use clap::Parser;

use crate::cli::{Command, ExportArgs, FetchArgs};
use crate::data::EiaClient;
use crate::domain::ReshapeConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fuelmix` binary.
pub fn run() -> Result<(), AppError> {
    // We want a bare `fuelmix` (and `fuelmix -s 2024-06-01`) to behave like
    // `fuelmix tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Show(args) => handle_fetch(args, OutputMode::Full),
        Command::Rank(args) => handle_fetch(args, OutputMode::RankOnly),
        Command::Export(args) => handle_export(args),
        Command::Tui(args) => handle_tui(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    RankOnly,
}

fn handle_fetch(args: FetchArgs, mode: OutputMode) -> Result<(), AppError> {
    let client = EiaClient::from_env()?;
    let config = reshape_config_from_args(&args);
    let selection = args.selection();

    let run = pipeline::run(&client, args.start, args.end, selection.as_ref(), &config)?;

    if mode == OutputMode::Full {
        println!("{}", crate::report::format_run_summary(&run, args.start, args.end));
    }

    if run.reshaped.chart.is_empty() {
        println!("No data available.");
        return Ok(());
    }

    if mode == OutputMode::Full {
        println!("{}", crate::report::format_wide_table(&run.reshaped));
    }
    println!("{}", crate::report::format_totals(&run.reshaped.totals));

    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let client = EiaClient::from_env()?;
    let config = reshape_config_from_args(&args.fetch);
    let selection = args.fetch.selection();

    let run = pipeline::run(&client, args.fetch.start, args.fetch.end, selection.as_ref(), &config)?;

    if run.reshaped.chart.is_empty() {
        println!("No data available.");
        return Ok(());
    }

    crate::io::export::write_wide_csv(&args.out, &run.reshaped, config.missing)?;
    println!(
        "Wrote {} ({} hours x {} fuel types)",
        args.out.display(),
        run.reshaped.wide.rows.len(),
        run.reshaped.totals.len()
    );

    Ok(())
}

fn handle_tui(args: FetchArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

pub fn reshape_config_from_args(args: &FetchArgs) -> ReshapeConfig {
    ReshapeConfig {
        order: args.order,
        duplicates: args.duplicates,
        missing: args.missing,
    }
}

/// Rewrite argv so `fuelmix` defaults to `fuelmix tui`.
///
/// Rules:
/// - `fuelmix`                      -> `fuelmix tui`
/// - `fuelmix -s 2024-06-01 ...`    -> `fuelmix tui -s 2024-06-01 ...`
/// - `fuelmix --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "rank" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["fuelmix"])), argv(&["fuelmix", "tui"]));
    }

    #[test]
    fn leading_flag_is_routed_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["fuelmix", "-s", "2024-06-01"])),
            argv(&["fuelmix", "tui", "-s", "2024-06-01"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(argv(&["fuelmix", "show"])),
            argv(&["fuelmix", "show"])
        );
        assert_eq!(
            rewrite_args(argv(&["fuelmix", "--help"])),
            argv(&["fuelmix", "--help"])
        );
    }
}
