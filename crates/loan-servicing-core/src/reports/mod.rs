pub mod projection;
pub mod rankings;

pub use projection::{monthly_projection, ProjectionMonth};
pub use rankings::{client_lending_ranking, client_receipts_ranking, ClientRanking};

use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::dashboard::{status_distribution, visible_loans, StatusSlice};
use crate::error::LoanServicingError;
use crate::policy::ServicingPolicy;
use crate::types::{validate_records, with_metadata, Client, ComputationOutput, Loan, Money, Payment, Viewer};
use crate::LoanServicingResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_lent: Money,
    /// Every payment recorded, principal and interest.
    pub total_received: Money,
    /// Outstanding principal plus accrued interest of unsettled loans.
    pub total_pending: Money,
}

/// First and last recorded activity across loans and payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySpan {
    pub first_activity: NaiveDate,
    pub last_activity: NaiveDate,
    /// Elapsed days divided by 30, rounded up.
    pub span_months: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub viewer: Viewer,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub policy: ServicingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub totals: PortfolioTotals,
    /// (received + projected receivable) / lent × 100.
    pub projected_collection_rate: Decimal,
    /// Receivable over the first 3 projected months.
    pub projected_next_3_months: Money,
    /// Receivable over the first 6 projected months.
    pub projected_next_6_months: Money,
    /// (received - lent) / lent × 100.
    pub estimated_roi: Decimal,
    /// Principal lent divided by the number of projection months.
    pub monthly_average_lent: Money,
    pub status_distribution: Vec<StatusSlice>,
    pub lending_ranking: Vec<ClientRanking>,
    pub receipts_ranking: Vec<ClientRanking>,
    pub projection: Vec<ProjectionMonth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySpan>,
}

pub fn portfolio_totals(loans: &[&Loan], payments: &[Payment]) -> PortfolioTotals {
    PortfolioTotals {
        total_lent: loans.iter().map(|l| l.principal).sum(),
        total_received: payments.iter().map(|p| p.amount).sum(),
        total_pending: loans
            .iter()
            .filter(|l| !l.is_settled())
            .map(|l| l.receivable())
            .sum(),
    }
}

pub fn activity_span(loans: &[&Loan], payments: &[Payment]) -> Option<ActivitySpan> {
    let dates = || {
        loans
            .iter()
            .map(|l| l.start_date)
            .chain(payments.iter().map(|p| p.date))
    };
    let first = dates().min()?;
    let last = dates().max()?;
    let days = (last - first).num_days();
    Some(ActivitySpan {
        first_activity: first,
        last_activity: last,
        span_months: (days + 29) / 30,
    })
}

/// `value / lent × 100`, zero when nothing was lent.
fn percent_of_lent(value: Money, lent: Money) -> LoanServicingResult<Decimal> {
    if lent.is_zero() {
        return Ok(Decimal::ZERO);
    }
    value
        .checked_div(lent)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or_else(|| LoanServicingError::InvalidInput {
            field: "principal".into(),
            reason: format!("{value} relative to {lent} lent is out of range."),
        })
}

/// Full portfolio report over every loan the viewer may see.
pub fn build_portfolio_report(
    input: &ReportInput,
) -> LoanServicingResult<ComputationOutput<PortfolioReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.policy.validate()?;

    let loans = visible_loans(&input.loans, &input.clients, &input.viewer);

    let loan_ids: HashSet<&str> = loans.iter().map(|l| l.id.as_str()).collect();
    let (payments, orphaned): (Vec<Payment>, Vec<Payment>) = input
        .payments
        .iter()
        .cloned()
        .partition(|p| loan_ids.contains(p.loan_id.as_str()));
    if !orphaned.is_empty() {
        warnings.push(format!(
            "{} payment(s) reference loans outside this report and were ignored",
            orphaned.len()
        ));
    }

    validate_records(loans.iter().copied(), &payments)?;

    let totals = portfolio_totals(&loans, &payments);
    let projection = monthly_projection(&loans, &payments, input.as_of, &input.policy)?;

    let projected = || projection.iter().filter(|m| m.is_projection).map(|m| m.receivable);
    let projected_receivable: Money = projected().sum();

    let projected_collection_rate =
        percent_of_lent(totals.total_received + projected_receivable, totals.total_lent)?;
    let estimated_roi = percent_of_lent(totals.total_received - totals.total_lent, totals.total_lent)?;
    let projected_next_3_months: Money = projected().take(3).sum();
    let projected_next_6_months: Money = projected().take(6).sum();
    let monthly_average_lent = if projection.is_empty() {
        Money::ZERO
    } else {
        totals.total_lent / Decimal::from(projection.len())
    };

    let report = PortfolioReport {
        projected_collection_rate,
        projected_next_3_months,
        projected_next_6_months,
        estimated_roi,
        monthly_average_lent,
        status_distribution: status_distribution(loans.iter().copied()),
        lending_ranking: client_lending_ranking(&input.clients, &loans, input.policy.ranking_limit),
        receipts_ranking: client_receipts_ranking(
            &input.clients,
            &loans,
            &payments,
            input.policy.ranking_limit,
        ),
        activity: activity_span(&loans, &payments),
        projection,
        totals,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio report — totals, client rankings, monthly cash projection",
        &serde_json::json!({
            "as_of": input.as_of.to_string(),
            "loans": loans.len(),
            "payments": payments.len(),
            "clients": input.clients.len(),
            "projection_tail_months": input.policy.projection_tail_months,
        }),
        warnings,
        elapsed,
        report,
    ))
}
