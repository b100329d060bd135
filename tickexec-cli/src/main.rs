//! tickexec CLI: replay and validate execution scenarios.
//!
//! Commands:
//! - `run`: replay a TOML scenario tick by tick and print a summary
//! - `validate`: parse and validate a scenario without running it

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tickexec_runner::{run_scenario, ScenarioConfig, ScenarioReport};

use crate::logging::{LogFormat, LoggingConfig};

#[derive(Parser)]
#[command(name = "tickexec", about = "tickexec: tick-driven order execution replay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario and print its summary.
    Run {
        /// Path to a TOML scenario file.
        #[arg(long)]
        scenario: PathBuf,

        /// Write the full JSON report to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Log level filter (overridden by RUST_LOG).
        #[arg(long, default_value = "info")]
        log_level: String,

        /// Log output format.
        #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
        log_format: LogFormat,
    },
    /// Parse and validate a scenario without running it.
    Validate {
        /// Path to a TOML scenario file.
        #[arg(long)]
        scenario: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            output,
            log_level,
            log_format,
        } => {
            LoggingConfig {
                level: log_level,
                format: log_format,
            }
            .init()?;
            run_cmd(&scenario, output.as_deref()).await
        }
        Commands::Validate { scenario } => validate_cmd(&scenario),
    }
}

fn load(path: &Path) -> Result<ScenarioConfig> {
    ScenarioConfig::from_file(path)
        .with_context(|| format!("loading scenario {}", path.display()))
}

async fn run_cmd(scenario: &Path, output: Option<&Path>) -> Result<()> {
    let config = load(scenario)?;
    let report = run_scenario(&config).await?;

    print_summary(&report);

    if let Some(path) = output {
        report.write_json(path)?;
        info!(path = %path.display(), "report written");
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

fn validate_cmd(scenario: &Path) -> Result<()> {
    let config = load(scenario)?;
    config.validate()?;
    println!(
        "{}: ok ({:?}, {} ticks, fingerprint {})",
        config.scenario.name,
        config.scenario.session_type,
        config.ticks.len(),
        config.fingerprint()?
    );
    Ok(())
}

fn print_summary(report: &ScenarioReport) {
    println!();
    println!("=== Scenario Result ===");
    println!("Scenario:       {}", report.scenario);
    println!("Session:        {:?}", report.session_type);
    println!("Fingerprint:    {}", report.fingerprint);
    println!("Ticks:          {}", report.ticks.len());
    println!("Orders opened:  {}", report.orders_opened);
    println!("Errors:         {}", report.errors.len());
    println!();
    println!("--- Balance ---");
    println!("Base:           {}", report.final_balance.base);
    println!("Quoted:         {}", report.final_balance.quoted);

    if let (Some(base), Some(quoted)) = (report.final_stage.base, report.final_stage.quoted) {
        println!();
        println!("--- Stage ---");
        println!("{:<8} {:>16} {:>16} {:>16}", "Asset", "Size", "Filled", "Fees");
        println!(
            "{:<8} {:>16} {:>16} {:>16}",
            "base", base.size, base.size_filled, base.fees_paid
        );
        println!(
            "{:<8} {:>16} {:>16} {:>16}",
            "quoted", quoted.size, quoted.size_filled, quoted.fees_paid
        );
    }

    if !report.orders.is_empty() {
        println!();
        println!("--- Orders ---");
        println!(
            "{:<16} {:>6} {:<18} {:<10} {:<26} {:>8}",
            "Runtime", "Serial", "Role", "Status", "Exit", "Filled %"
        );
        for order in &report.orders {
            println!(
                "{:<16} {:>6} {:<18} {:<10} {:<26} {:>8}",
                order.runtime.as_str(),
                order.serial_number,
                order.role.map(|role| role.to_string()).unwrap_or_default(),
                order.status.to_string(),
                order.exit_type.map(|exit| exit.to_string()).unwrap_or_default(),
                order.statistics.percentage_filled.round_dp(2).to_string(),
            );
        }
    }

    for error in &report.errors {
        println!("tick {}: {} ({})", error.tick, error.message, error.node_id);
    }
}
