use chrono::{Local, NaiveDate};
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use loan_servicing_core::dashboard::{
    build_dashboard, loans_in_window, portfolio_timeline, status_distribution, visible_loans,
    DashboardInput,
};
use loan_servicing_core::installments::{build_agenda, build_schedule, AgendaInput, ScheduleInput};
use loan_servicing_core::ledger::{apply_payment as apply, open_loan as open, LoanApplication};
use loan_servicing_core::reports::{build_portfolio_report, ReportInput};
use loan_servicing_core::{validate_records, Loan, Payment};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse a JSON input object, defaulting `as_of` to today's local date.
fn parse_input<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    let mut value: Value = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let map = value
        .as_object_mut()
        .ok_or_else(|| to_napi_error("input must be a JSON object"))?;
    map.entry("as_of")
        .or_insert_with(|| Value::String(today().to_string()));
    serde_json::from_value(value).map_err(to_napi_error)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Installments
// ---------------------------------------------------------------------------

#[napi]
pub fn derive_schedule(input_json: String) -> NapiResult<String> {
    let input: ScheduleInput = parse_input(&input_json)?;
    let output = build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn installment_agenda(input_json: String) -> NapiResult<String> {
    let input: AgendaInput = parse_input(&input_json)?;
    let output = build_agenda(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[napi]
pub fn dashboard(input_json: String) -> NapiResult<String> {
    let input: DashboardInput = parse_input(&input_json)?;
    let output = build_dashboard(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_status_distribution(input_json: String) -> NapiResult<String> {
    let input: DashboardInput = parse_input(&input_json)?;
    let loans = loans_in_window(
        &input.loans,
        &input.clients,
        &input.viewer,
        input.window,
        input.as_of,
    );
    validate_records(loans.iter().copied(), &[]).map_err(to_napi_error)?;
    serde_json::to_string(&status_distribution(loans)).map_err(to_napi_error)
}

#[napi]
pub fn timeline(input_json: String) -> NapiResult<String> {
    let input: DashboardInput = parse_input(&input_json)?;
    let loans = visible_loans(&input.loans, &input.clients, &input.viewer);
    validate_records(loans.iter().copied(), &input.payments).map_err(to_napi_error)?;
    let points = portfolio_timeline(&loans, &input.payments, input.window, input.as_of);
    serde_json::to_string(&points).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[napi]
pub fn portfolio_report(input_json: String) -> NapiResult<String> {
    let input: ReportInput = parse_input(&input_json)?;
    let output = build_portfolio_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ApplyPaymentInput {
    loan: Loan,
    payment: Payment,
    as_of: NaiveDate,
}

#[derive(Deserialize)]
struct OpenLoanInput {
    id: String,
    application: LoanApplication,
    as_of: NaiveDate,
}

#[napi]
pub fn apply_payment(input_json: String) -> NapiResult<String> {
    let input: ApplyPaymentInput = parse_input(&input_json)?;
    let loan = apply(&input.loan, &input.payment, input.as_of).map_err(to_napi_error)?;
    serde_json::to_string(&loan).map_err(to_napi_error)
}

#[napi]
pub fn open_loan(input_json: String) -> NapiResult<String> {
    let input: OpenLoanInput = parse_input(&input_json)?;
    let loan = open(input.id, input.application, input.as_of).map_err(to_napi_error)?;
    serde_json::to_string(&loan).map_err(to_napi_error)
}
