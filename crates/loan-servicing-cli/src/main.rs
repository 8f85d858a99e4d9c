mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use chrono::NaiveDate;
use commands::dashboard::{DashboardArgs, DistributionArgs, TimelineArgs};
use commands::installments::{AgendaArgs, ScheduleArgs};
use commands::ledger::{ApplyPaymentArgs, OpenLoanArgs};
use commands::reports::ReportArgs;

/// Loan servicing: installment schedules, dashboards and portfolio reports
#[derive(Parser)]
#[command(
    name = "loans",
    version,
    about = "Loan installment schedules, dashboards and portfolio reports",
    long_about = "Derives installment schedules from loan and payment records and \
                  aggregates portfolio KPIs with decimal precision. Records are read \
                  as JSON from --input or stdin; nothing is stored."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Reference date (YYYY-MM-DD). Overrides `as_of` in the input; defaults to today
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Servicing policy file (YAML or JSON)
    #[arg(long, env = "LOANS_CONFIG", global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the installment schedule of one loan
    Schedule(ScheduleArgs),
    /// Overdue, upcoming and due-soon installments across loans
    Agenda(AgendaArgs),
    /// Dashboard KPIs, status mix and timeline
    Dashboard(DashboardArgs),
    /// Loan count and principal per status
    Distribution(DistributionArgs),
    /// Cumulative portfolio timeline
    Timeline(TimelineArgs),
    /// Portfolio report: totals, rankings, monthly projection
    Report(ReportArgs),
    /// Apply a payment to a loan's balances
    ApplyPayment(ApplyPaymentArgs),
    /// Open a loan from an application
    OpenLoan(OpenLoanArgs),
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

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOANS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let ctx = match config::Context::load(cli.as_of, cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::installments::run_schedule(args, &ctx),
        Commands::Agenda(args) => commands::installments::run_agenda(args, &ctx),
        Commands::Dashboard(args) => commands::dashboard::run_dashboard(args, &ctx),
        Commands::Distribution(args) => commands::dashboard::run_distribution(args, &ctx),
        Commands::Timeline(args) => commands::dashboard::run_timeline(args, &ctx),
        Commands::Report(args) => commands::reports::run_report(args, &ctx),
        Commands::ApplyPayment(args) => commands::ledger::run_apply_payment(args, &ctx),
        Commands::OpenLoan(args) => commands::ledger::run_open_loan(args, &ctx),
        Commands::Version => {
            println!("loans {}", env!("CARGO_PKG_VERSION"));
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
