//! Cross-loan view of installments that need attention.

use std::collections::HashMap;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::installments::payments_by_loan;
use crate::installments::schedule::{derive_installments_with, Installment, InstallmentStatus};
use crate::policy::ServicingPolicy;
use crate::types::{with_metadata, Client, ComputationOutput, Loan, Payment};
use crate::LoanServicingResult;

/// How pressing a due date is relative to `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueUrgency {
    Overdue,
    DueToday,
    Urgent,
    Normal,
}

impl DueUrgency {
    pub fn classify(days_until_due: i64, urgent_threshold_days: i64) -> Self {
        if days_until_due < 0 {
            DueUrgency::Overdue
        } else if days_until_due == 0 {
            DueUrgency::DueToday
        } else if days_until_due <= urgent_threshold_days {
            DueUrgency::Urgent
        } else {
            DueUrgency::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub loan_id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub installment: Installment,
    pub days_until_due: i64,
    pub urgency: DueUrgency,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentAgenda {
    /// Unpaid installments already past due, oldest first.
    pub overdue: Vec<ScheduledInstallment>,
    /// Pending installments due within the upcoming horizon.
    pub upcoming: Vec<ScheduledInstallment>,
    /// Unpaid installments due within the due-soon horizon, past-due included.
    pub due_soon: Vec<ScheduledInstallment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaInput {
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub clients: Vec<Client>,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub policy: ServicingPolicy,
}

/// Collect overdue, upcoming and due-soon installments across all open loans.
pub fn installment_agenda(
    loans: &[Loan],
    payments: &[Payment],
    clients: &[Client],
    as_of: NaiveDate,
    policy: &ServicingPolicy,
) -> LoanServicingResult<InstallmentAgenda> {
    let by_loan = payments_by_loan(payments);
    let names: HashMap<&str, &str> = clients
        .iter()
        .map(|c| (c.id.as_str(), c.full_name.as_str()))
        .collect();

    let mut agenda = InstallmentAgenda::default();

    for loan in loans.iter().filter(|l| !l.is_settled()) {
        let loan_payments = by_loan.get(loan.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let schedule = derive_installments_with(loan, loan_payments, as_of, policy.payment_matching)?;

        for installment in schedule.into_iter().filter(|i| !i.is_paid()) {
            let days = calendar::days_until(installment.due_date, as_of);
            let entry = ScheduledInstallment {
                loan_id: loan.id.clone(),
                client_id: loan.client_id.clone(),
                client_name: names.get(loan.client_id.as_str()).map(|n| n.to_string()),
                days_until_due: days,
                urgency: DueUrgency::classify(days, policy.urgent_threshold_days),
                installment,
            };

            if days <= policy.due_soon_horizon_days {
                agenda.due_soon.push(entry.clone());
            }
            match entry.installment.status {
                InstallmentStatus::Overdue => agenda.overdue.push(entry),
                InstallmentStatus::Pending if days <= policy.upcoming_horizon_days => {
                    agenda.upcoming.push(entry)
                }
                _ => {}
            }
        }
    }

    for bucket in [&mut agenda.overdue, &mut agenda.upcoming, &mut agenda.due_soon] {
        bucket.sort_by(|a, b| {
            a.installment
                .due_date
                .cmp(&b.installment.due_date)
                .then_with(|| a.loan_id.cmp(&b.loan_id))
                .then_with(|| a.installment.number.cmp(&b.installment.number))
        });
    }

    Ok(agenda)
}

pub fn build_agenda(input: &AgendaInput) -> LoanServicingResult<ComputationOutput<InstallmentAgenda>> {
    let start = Instant::now();
    input.policy.validate()?;

    let agenda = installment_agenda(
        &input.loans,
        &input.payments,
        &input.clients,
        input.as_of,
        &input.policy,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Installment agenda across open loans",
        &serde_json::json!({
            "loans": input.loans.len(),
            "as_of": input.as_of.to_string(),
            "due_soon_horizon_days": input.policy.due_soon_horizon_days,
            "upcoming_horizon_days": input.policy.upcoming_horizon_days,
        }),
        Vec::new(),
        elapsed,
        agenda,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_bands() {
        assert_eq!(DueUrgency::classify(-1, 3), DueUrgency::Overdue);
        assert_eq!(DueUrgency::classify(0, 3), DueUrgency::DueToday);
        assert_eq!(DueUrgency::classify(3, 3), DueUrgency::Urgent);
        assert_eq!(DueUrgency::classify(4, 3), DueUrgency::Normal);
    }
}
