//! Month-by-month cash projection: what came in, what is scheduled, what is late.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::installments::schedule::{derive_installments_with, Installment, InstallmentStatus};
use crate::installments::payments_by_loan;
use crate::policy::ServicingPolicy;
use crate::error::LoanServicingError;
use crate::types::{validate_records, Loan, Money, Payment};
use crate::LoanServicingResult;

/// Longest projection produced, in months.
pub const MAX_PROJECTION_MONTHS: i64 = 6000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionMonth {
    /// First day of the month.
    pub month: NaiveDate,
    /// Payments dated in the month. Zero for future months.
    pub received: Money,
    /// Pending installments falling due in the month.
    pub receivable: Money,
    /// Overdue installments that fell due in the month. Zero for future months.
    pub overdue: Money,
    /// The month starts after `as_of`.
    pub is_projection: bool,
}

/// Build one row per month from the first recorded activity through the last
/// pending installment plus the policy's tail.
///
/// Only loans with an installment plan push the end month out; bullet loans
/// still contribute their receivable to the months inside the range.
pub fn monthly_projection(
    loans: &[&Loan],
    payments: &[Payment],
    as_of: NaiveDate,
    policy: &ServicingPolicy,
) -> LoanServicingResult<Vec<ProjectionMonth>> {
    validate_records(loans.iter().copied(), payments)?;

    let first_activity = loans
        .iter()
        .map(|l| l.start_date)
        .chain(payments.iter().map(|p| p.date))
        .min();
    let first = match first_activity {
        Some(date) => calendar::month_start(date),
        None => NaiveDate::from_ymd_opt(as_of.year() - 1, as_of.month(), 1)
            .unwrap_or_else(|| calendar::month_start(as_of)),
    };

    let by_loan = payments_by_loan(payments);
    let mut open_installments: Vec<Installment> = Vec::new();
    let mut last_pending = as_of;
    for loan in loans.iter().filter(|l| !l.is_settled()) {
        let loan_payments = by_loan.get(loan.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let schedule = derive_installments_with(loan, loan_payments, as_of, policy.payment_matching)?;
        if matches!(loan.installment_count, Some(n) if n > 0) {
            last_pending = schedule
                .iter()
                .filter(|i| i.status == InstallmentStatus::Pending)
                .map(|i| i.due_date)
                .fold(last_pending, NaiveDate::max);
        }
        open_installments.extend(schedule);
    }
    let end = calendar::add_months(last_pending, policy.projection_tail_months)?;

    let months = (end.year() as i64 - first.year() as i64) * 12
        + (end.month() as i64 - first.month() as i64);
    if months > MAX_PROJECTION_MONTHS {
        return Err(LoanServicingError::InvalidInput {
            field: "as_of".into(),
            reason: format!(
                "Projection from {first} to {end} spans {months} months; at most {MAX_PROJECTION_MONTHS} are produced."
            ),
        });
    }

    let mut rows = Vec::new();
    let mut month = first;
    while month <= end {
        let is_projection = month > as_of;

        let received = if is_projection {
            Money::ZERO
        } else {
            payments
                .iter()
                .filter(|p| calendar::same_month(p.date, month))
                .map(|p| p.amount)
                .sum()
        };

        let due_this_month = |status: InstallmentStatus| -> Money {
            open_installments
                .iter()
                .filter(|i| i.status == status && calendar::same_month(i.due_date, month))
                .map(|i| i.total_amount)
                .sum()
        };

        rows.push(ProjectionMonth {
            month,
            received,
            receivable: due_this_month(InstallmentStatus::Pending),
            overdue: if is_projection {
                Money::ZERO
            } else {
                due_this_month(InstallmentStatus::Overdue)
            },
            is_projection,
        });

        month = calendar::next_month_start(month)?;
    }

    Ok(rows)
}
