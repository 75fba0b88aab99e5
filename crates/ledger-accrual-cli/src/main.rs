mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::process;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::analysis::{AuditArgs, FluxArgs};
use commands::pipeline::{BalancesArgs, ConfigArgs, RunArgs, SchedulesArgs, StatementArgs};

/// Cash-to-accrual ledger aggregation
#[derive(Parser)]
#[command(
    name = "accrue",
    version,
    about = "Cash-to-accrual ledger aggregation",
    long_about = "Turns raw sales, purchases, payments and loans into depreciation and \
                  accrual schedules, per-account yearly aggregates and accrual-basis \
                  financial statements, then reconciles them against the raw records."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage and print the statements with a run summary
    Run(RunArgs),
    /// Look up statement rows for one year or a range
    Statement(StatementArgs),
    /// Yearly movement and running balance of one account
    Balances(BalancesArgs),
    /// Print the regenerated depreciation and accrual schedules
    Schedules(SchedulesArgs),
    /// Reconcile revenue and cash against the raw records
    Audit(AuditArgs),
    /// Year-over-year comparison of two statement rows
    Flux(FluxArgs),
    /// Print the effective pipeline configuration
    Config(ConfigArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool, log_file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            let file: File = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file '{}': {}", path, e))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::pipeline::run_pipeline(args),
        Commands::Statement(args) => commands::pipeline::run_statement(args),
        Commands::Balances(args) => commands::pipeline::run_balances(args),
        Commands::Schedules(args) => commands::pipeline::run_schedules(args),
        Commands::Audit(args) => commands::analysis::run_audit(args),
        Commands::Flux(args) => commands::analysis::run_flux(args),
        Commands::Config(args) => commands::pipeline::run_config(args),
        Commands::Version => {
            println!("accrue {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
