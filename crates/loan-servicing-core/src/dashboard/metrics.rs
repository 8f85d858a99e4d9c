//! Portfolio KPIs for the dashboard.
//!
//! The interest estimates are coarse: the month figure spreads
//! accrued interest over a 30-day month, the day figure applies the stored
//! rate over a 365-day year to the current balance. Neither is an accrual.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::dashboard::window::{loans_in_window, TimeWindow};
use crate::installments::DueUrgency;
use crate::policy::ServicingPolicy;
use crate::types::{validate_records, Client, Loan, LoanStatus, Money, Viewer};
use crate::LoanServicingResult;

/// An active loan close to (or past) its due date, paired with its borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueSoonLoan {
    pub loan: Loan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    pub days_until_due: i64,
    pub is_overdue: bool,
    pub urgency: DueUrgency,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub upcoming_due_soon: Vec<DueSoonLoan>,
    pub total_accrued_interest: Money,
    pub total_principal_lent: Money,
    pub total_outstanding_principal: Money,
    /// Outstanding principal plus accrued interest of every unsettled loan.
    pub total_receivable: Money,
    pub monthly_interest_estimate: Money,
    pub daily_interest_estimate: Money,
    pub total_loans: usize,
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub settled_loans: usize,
}

/// Compute dashboard KPIs over the loans the viewer may see inside the window.
pub fn compute_dashboard_metrics(
    loans: &[Loan],
    clients: &[Client],
    viewer: &Viewer,
    window: TimeWindow,
    as_of: NaiveDate,
    policy: &ServicingPolicy,
) -> LoanServicingResult<DashboardMetrics> {
    policy.validate()?;

    let filtered = loans_in_window(loans, clients, viewer, window, as_of);
    validate_records(filtered.iter().copied(), &[])?;

    let count = |status: LoanStatus| filtered.iter().filter(|l| l.status == status).count();

    let month_start = calendar::month_start(as_of);

    let metrics = DashboardMetrics {
        upcoming_due_soon: due_soon(&filtered, clients, as_of, policy),
        total_accrued_interest: filtered.iter().map(|l| l.accrued_interest).sum(),
        total_principal_lent: filtered.iter().map(|l| l.principal).sum(),
        total_outstanding_principal: filtered.iter().map(|l| l.outstanding_principal).sum(),
        total_receivable: filtered
            .iter()
            .filter(|l| !l.is_settled())
            .map(|l| l.receivable())
            .sum(),
        monthly_interest_estimate: filtered
            .iter()
            .filter(|l| l.start_date >= month_start)
            .map(|l| l.accrued_interest / policy.monthly_interest_divisor)
            .sum(),
        daily_interest_estimate: filtered
            .iter()
            .filter(|l| l.status == LoanStatus::Active)
            .map(|l| l.interest_rate / policy.day_count_basis * l.outstanding_principal)
            .sum::<Decimal>(),
        total_loans: filtered.len(),
        active_loans: count(LoanStatus::Active),
        overdue_loans: count(LoanStatus::Overdue),
        settled_loans: count(LoanStatus::Settled),
    };

    tracing::debug!(
        window = %window,
        loans = metrics.total_loans,
        due_soon = metrics.upcoming_due_soon.len(),
        "computed dashboard metrics"
    );

    Ok(metrics)
}

/// Active loans due within the horizon, past-due first, then by due date.
fn due_soon(
    loans: &[&Loan],
    clients: &[Client],
    as_of: NaiveDate,
    policy: &ServicingPolicy,
) -> Vec<DueSoonLoan> {
    let by_id: HashMap<&str, &Client> = clients.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut candidates: Vec<&Loan> = loans
        .iter()
        .copied()
        .filter(|l| l.status == LoanStatus::Active)
        .filter(|l| calendar::days_until(l.due_date, as_of) <= policy.due_soon_horizon_days)
        .collect();

    candidates.sort_by(|a, b| {
        let a_overdue = a.due_date < as_of;
        let b_overdue = b.due_date < as_of;
        b_overdue
            .cmp(&a_overdue)
            .then_with(|| a.due_date.cmp(&b.due_date))
    });

    candidates
        .into_iter()
        .take(policy.due_soon_limit)
        .map(|loan| {
            let days = calendar::days_until(loan.due_date, as_of);
            DueSoonLoan {
                loan: loan.clone(),
                client: by_id.get(loan.client_id.as_str()).map(|c| (*c).clone()),
                days_until_due: days,
                is_overdue: days < 0,
                urgency: DueUrgency::classify(days, policy.urgent_threshold_days),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InterestMode, RateFrequency};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn loan(id: &str, status: LoanStatus, start: NaiveDate, due: NaiveDate) -> Loan {
        Loan {
            id: id.into(),
            client_id: "C1".into(),
            principal: dec!(1000),
            interest_rate: dec!(10),
            rate_frequency: RateFrequency::Monthly,
            interest_mode: InterestMode::Simple,
            start_date: start,
            due_date: due,
            installment_count: None,
            status,
            outstanding_principal: if status == LoanStatus::Settled {
                Decimal::ZERO
            } else {
                dec!(1000)
            },
            accrued_interest: dec!(60),
            total_value: dec!(1060),
            last_updated: start,
            notes: None,
        }
    }

    #[test]
    fn test_due_soon_sorts_overdue_first() {
        let as_of = d(2024, 6, 10);
        let loans = vec![
            loan("B", LoanStatus::Active, d(2024, 6, 1), d(2024, 6, 12)),
            loan("A", LoanStatus::Active, d(2024, 6, 1), d(2024, 6, 5)),
            loan("C", LoanStatus::Active, d(2024, 6, 1), d(2024, 7, 30)),
        ];
        let m = compute_dashboard_metrics(
            &loans,
            &[],
            &Viewer::administrator(),
            TimeWindow::All,
            as_of,
            &ServicingPolicy::default(),
        )
        .unwrap();
        let ids: Vec<&str> = m.upcoming_due_soon.iter().map(|e| e.loan.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(m.upcoming_due_soon[0].is_overdue);
        assert_eq!(m.upcoming_due_soon[0].days_until_due, -5);
        assert_eq!(m.upcoming_due_soon[1].urgency, DueUrgency::Urgent);
    }

    #[test]
    fn test_daily_and_monthly_estimates() {
        let as_of = d(2024, 6, 20);
        let loans = vec![
            loan("new", LoanStatus::Active, d(2024, 6, 2), d(2024, 12, 2)),
            loan("old", LoanStatus::Overdue, d(2024, 5, 2), d(2024, 6, 2)),
        ];
        let m = compute_dashboard_metrics(
            &loans,
            &[],
            &Viewer::administrator(),
            TimeWindow::All,
            as_of,
            &ServicingPolicy::default(),
        )
        .unwrap();
        // 60 / 30 for the loan started this month only
        assert_eq!(m.monthly_interest_estimate, dec!(2));
        // (10 / 365) * 1000 for the active loan only
        assert_eq!(m.daily_interest_estimate, dec!(10) / dec!(365) * dec!(1000));
    }

    #[test]
    fn test_empty_portfolio_is_all_zero() {
        let m = compute_dashboard_metrics(
            &[],
            &[],
            &Viewer::administrator(),
            TimeWindow::ThirtyDays,
            d(2024, 6, 20),
            &ServicingPolicy::default(),
        )
        .unwrap();
        assert_eq!(m, DashboardMetrics::default());
    }
}
