//! Balance bookkeeping performed when loans are opened and payments recorded.
//!
//! Both operations return a new `Loan` record; the caller persists it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanServicingError;
use crate::types::{InterestMode, Loan, LoanStatus, Money, Payment, Rate, RateFrequency};
use crate::LoanServicingResult;

/// Terms captured when a loan is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub client_id: String,
    pub principal: Money,
    pub interest_rate: Rate,
    #[serde(default)]
    pub rate_frequency: RateFrequency,
    #[serde(default)]
    pub interest_mode: InterestMode,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Open a loan: nothing repaid, no interest accrued yet.
pub fn open_loan(
    id: impl Into<String>,
    application: LoanApplication,
    opened_on: NaiveDate,
) -> LoanServicingResult<Loan> {
    if application.due_date < application.start_date {
        return Err(LoanServicingError::InvalidInput {
            field: "due_date".into(),
            reason: "Due date cannot precede the start date.".into(),
        });
    }

    let loan = Loan {
        id: id.into(),
        client_id: application.client_id,
        principal: application.principal,
        interest_rate: application.interest_rate,
        rate_frequency: application.rate_frequency,
        interest_mode: application.interest_mode,
        start_date: application.start_date,
        due_date: application.due_date,
        installment_count: application.installment_count,
        status: LoanStatus::Active,
        outstanding_principal: application.principal,
        accrued_interest: Decimal::ZERO,
        total_value: application.principal,
        last_updated: opened_on,
        notes: application.notes,
    };
    loan.validate()?;
    Ok(loan)
}

/// Apply a recorded payment to a loan's balances.
///
/// Balances never go below zero. The loan is settled once the principal
/// portion covers the outstanding principal; otherwise its status is kept.
pub fn apply_payment(
    loan: &Loan,
    payment: &Payment,
    recorded_on: NaiveDate,
) -> LoanServicingResult<Loan> {
    if payment.loan_id != loan.id {
        return Err(LoanServicingError::InvalidInput {
            field: "loan_id".into(),
            reason: format!(
                "Payment {} is recorded against loan {}, not {}.",
                payment.id, payment.loan_id, loan.id
            ),
        });
    }
    loan.validate()?;
    payment.validate()?;
    if payment.principal_portion + payment.interest_portion != payment.amount {
        tracing::warn!(
            payment_id = %payment.id,
            amount = %payment.amount,
            principal = %payment.principal_portion,
            interest = %payment.interest_portion,
            "payment portions do not add up to the amount"
        );
    }

    let remaining = loan.outstanding_principal - payment.principal_portion;
    let remaining_interest = loan.accrued_interest - payment.interest_portion;

    let mut updated = loan.clone();
    updated.outstanding_principal = remaining.max(Decimal::ZERO);
    updated.accrued_interest = remaining_interest.max(Decimal::ZERO);
    if remaining <= Decimal::ZERO {
        updated.status = LoanStatus::Settled;
    }
    updated.last_updated = recorded_on;

    tracing::debug!(
        loan_id = %loan.id,
        payment_id = %payment.id,
        outstanding = %updated.outstanding_principal,
        status = updated.status.label(),
        "applied payment"
    );

    Ok(updated)
}
