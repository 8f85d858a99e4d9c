use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use loan_servicing_core::ledger::{apply_payment, open_loan, LoanApplication};
use loan_servicing_core::{Loan, Payment};

use crate::config::Context;
use crate::input;

/// Arguments for applying a payment
#[derive(Args)]
pub struct ApplyPaymentArgs {
    /// Path to JSON input file: { loan, payment, as_of? }
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for opening a loan
#[derive(Args)]
pub struct OpenLoanArgs {
    /// Path to JSON input file: { id, application, as_of? }
    #[arg(long)]
    pub input: Option<String>,

    /// Loan id; overrides `id` in the input
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Deserialize)]
struct ApplyPaymentInput {
    loan: Loan,
    payment: Payment,
    /// Recording date
    as_of: NaiveDate,
}

#[derive(Deserialize)]
struct OpenLoanInput {
    #[serde(default)]
    id: Option<String>,
    application: LoanApplication,
    /// Opening date
    as_of: NaiveDate,
}

pub fn run_apply_payment(args: ApplyPaymentArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = ctx.apply(input::read_records(args.input.as_deref())?)?;
    let parsed: ApplyPaymentInput = serde_json::from_value(raw)?;
    let updated = apply_payment(&parsed.loan, &parsed.payment, parsed.as_of)?;
    Ok(serde_json::to_value(updated)?)
}

pub fn run_open_loan(args: OpenLoanArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = ctx.apply(input::read_records(args.input.as_deref())?)?;
    let parsed: OpenLoanInput = serde_json::from_value(raw)?;
    let id = args
        .id
        .or(parsed.id)
        .ok_or("--id is required (or provide `id` in the input)")?;
    let loan = open_loan(id, parsed.application, parsed.as_of)?;
    Ok(serde_json::to_value(loan)?)
}
