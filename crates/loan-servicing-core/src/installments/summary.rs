use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::installments::schedule::{Installment, InstallmentStatus};
use crate::types::Money;

/// Counts and totals over one loan's schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub total: usize,
    pub paid: usize,
    pub overdue: usize,
    pub pending: usize,
    pub total_value: Money,
    /// Sum of the amounts actually recorded against paid installments.
    pub paid_value: Money,
    /// Scheduled value of every installment not yet paid.
    pub pending_value: Money,
    /// Share of installments paid, 0-100.
    pub percent_paid: Decimal,
}

pub fn summarize_installments(installments: &[Installment]) -> InstallmentSummary {
    let count = |status: InstallmentStatus| installments.iter().filter(|i| i.status == status).count();

    let total = installments.len();
    let paid = count(InstallmentStatus::Paid);

    let percent_paid = if total == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(paid) / Decimal::from(total) * dec!(100)
    };

    InstallmentSummary {
        total,
        paid,
        overdue: count(InstallmentStatus::Overdue),
        pending: count(InstallmentStatus::Pending),
        total_value: installments.iter().map(|i| i.total_amount).sum(),
        paid_value: installments.iter().filter_map(|i| i.paid_amount).sum(),
        pending_value: installments
            .iter()
            .filter(|i| !i.is_paid())
            .map(|i| i.total_amount)
            .sum(),
        percent_paid,
    }
}
