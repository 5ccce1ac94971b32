//! tap-zoomph - Singer tap for Zoomph partner-mention reports
//!
//! Writes SCHEMA and RECORD messages to stdout; logs and the run summary
//! go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use tap_zoomph::{Config, RunOutcome, State, SyncSummary};

#[derive(Parser)]
#[command(name = "tap-zoomph")]
#[command(about = "Singer tap for Zoomph partner-mention reports")]
#[command(version)]
struct Cli {
    /// Config file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// State file path (JSON, read but not applied)
    #[arg(short, long)]
    state: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    tap_zoomph_core::init_logging();

    let config = Config::load(cli.config.as_deref())?;
    let state = State::load(cli.state.as_deref())?;

    match tap_zoomph::run(&config, &state, std::io::stdout().lock())? {
        RunOutcome::Completed(summary) => {
            print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Failed(e) => {
            log::error!("Sync failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_summary(summary: &SyncSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Zoomph").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    table.add_row(vec!["Report", &summary.report_id.to_string()]);
    table.add_row(vec!["Polls", &summary.poll_attempts.to_string()]);
    table.add_row(vec!["Records", &summary.records.to_string()]);
    eprintln!("\n{table}");
}
