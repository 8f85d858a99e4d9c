use clap::Args;
use serde_json::Value;

use loan_servicing_core::reports::{build_portfolio_report, ReportInput};

use crate::config::Context;
use crate::input;

/// Arguments for the portfolio report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON input file: { loans, payments, clients, viewer?, as_of?, policy? }
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_report(args: ReportArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = ctx.apply(input::read_records(args.input.as_deref())?)?;
    let report_input: ReportInput = serde_json::from_value(raw)?;
    let result = build_portfolio_report(&report_input)?;
    Ok(serde_json::to_value(result)?)
}
