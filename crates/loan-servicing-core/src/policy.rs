use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanServicingError;
use crate::LoanServicingResult;

/// How recorded payments are attributed to derived installments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMatching {
    /// An installment is paid when any payment falls in the same calendar
    /// month and year as its due date. First payment in input order wins.
    #[default]
    CalendarMonth,
    /// Payments, oldest first, settle installments in ascending order,
    /// one payment per installment.
    Sequential,
}

/// Tunable knobs for schedule derivation and portfolio aggregation.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicingPolicy {
    pub payment_matching: PaymentMatching,
    /// Loans due within this many days (or already past due) are "due soon".
    pub due_soon_horizon_days: i64,
    /// Maximum number of entries in the due-soon list.
    pub due_soon_limit: usize,
    /// Look-ahead for the pending-installment agenda.
    pub upcoming_horizon_days: i64,
    /// Days-until-due at or below which an installment is flagged urgent.
    pub urgent_threshold_days: i64,
    /// Divisor applied to accrued interest for the month-to-date estimate.
    pub monthly_interest_divisor: Decimal,
    /// Days per year used for the daily interest estimate.
    pub day_count_basis: Decimal,
    /// Cap on client rankings in reports.
    pub ranking_limit: usize,
    /// Months appended after the last pending installment in projections.
    pub projection_tail_months: u32,
}

impl Default for ServicingPolicy {
    fn default() -> Self {
        ServicingPolicy {
            payment_matching: PaymentMatching::CalendarMonth,
            due_soon_horizon_days: 7,
            due_soon_limit: 10,
            upcoming_horizon_days: 30,
            urgent_threshold_days: 3,
            monthly_interest_divisor: dec!(30),
            day_count_basis: dec!(365),
            ranking_limit: 10,
            projection_tail_months: 3,
        }
    }
}

impl ServicingPolicy {
    pub fn validate(&self) -> LoanServicingResult<()> {
        if self.monthly_interest_divisor < Decimal::ONE {
            return Err(LoanServicingError::InvalidInput {
                field: "monthly_interest_divisor".into(),
                reason: "Monthly interest divisor must be at least 1.".into(),
            });
        }
        if self.day_count_basis < Decimal::ONE {
            return Err(LoanServicingError::InvalidInput {
                field: "day_count_basis".into(),
                reason: "Day count basis must be at least 1.".into(),
            });
        }
        if self.due_soon_horizon_days < 0 {
            return Err(LoanServicingError::InvalidInput {
                field: "due_soon_horizon_days".into(),
                reason: "Due-soon horizon cannot be negative.".into(),
            });
        }
        if self.upcoming_horizon_days < 0 {
            return Err(LoanServicingError::InvalidInput {
                field: "upcoming_horizon_days".into(),
                reason: "Upcoming horizon cannot be negative.".into(),
            });
        }
        if self.urgent_threshold_days < 0 {
            return Err(LoanServicingError::InvalidInput {
                field: "urgent_threshold_days".into(),
                reason: "Urgent threshold cannot be negative.".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_policy_keeps_defaults() {
        let policy: ServicingPolicy =
            serde_json::from_str(r#"{"payment_matching": "sequential", "due_soon_limit": 5}"#)
                .unwrap();
        assert_eq!(policy.payment_matching, PaymentMatching::Sequential);
        assert_eq!(policy.due_soon_limit, 5);
        assert_eq!(policy.due_soon_horizon_days, 7);
        assert_eq!(policy.day_count_basis, dec!(365));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let policy = ServicingPolicy {
            monthly_interest_divisor: Decimal::ZERO,
            ..ServicingPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_fractional_basis_rejected() {
        let policy = ServicingPolicy {
            day_count_basis: dec!(0.0000001),
            ..ServicingPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
