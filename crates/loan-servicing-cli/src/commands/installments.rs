use clap::Args;
use serde_json::Value;

use loan_servicing_core::installments::{build_agenda, build_schedule, AgendaInput, ScheduleInput};

use crate::config::Context;
use crate::input;

/// Arguments for a single-loan schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file: { loan, payments, as_of?, policy? }
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the cross-loan installment agenda
#[derive(Args)]
pub struct AgendaArgs {
    /// Path to JSON input file: { loans, payments, clients, as_of?, policy? }
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = ctx.apply(input::read_records(args.input.as_deref())?)?;
    let schedule_input: ScheduleInput = serde_json::from_value(raw)?;
    let result = build_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_agenda(args: AgendaArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = ctx.apply(input::read_records(args.input.as_deref())?)?;
    let agenda_input: AgendaInput = serde_json::from_value(raw)?;
    let result = build_agenda(&agenda_input)?;
    Ok(serde_json::to_value(result)?)
}
