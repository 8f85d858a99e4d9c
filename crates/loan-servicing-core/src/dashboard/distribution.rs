use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Loan, LoanStatus, Money};

/// Share of the portfolio in one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub status: LoanStatus,
    pub count: usize,
    /// Sum of original principal of loans in this status.
    pub principal: Money,
    /// Percentage of loan count, one decimal place.
    pub percentage: Decimal,
}

/// One slice per status, always in active/overdue/settled order.
pub fn status_distribution<'a, I>(loans: I) -> Vec<StatusSlice>
where
    I: IntoIterator<Item = &'a Loan>,
{
    let loans: Vec<&Loan> = loans.into_iter().collect();
    let total = loans.len();

    LoanStatus::ALL
        .iter()
        .map(|status| {
            let members: Vec<&&Loan> = loans.iter().filter(|l| l.status == *status).collect();
            let count = members.len();
            let percentage = if total == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from(count) / Decimal::from(total) * dec!(100)).round_dp(1)
            };
            StatusSlice {
                status: *status,
                count,
                principal: members.iter().map(|l| l.principal).sum(),
                percentage,
            }
        })
        .collect()
}
