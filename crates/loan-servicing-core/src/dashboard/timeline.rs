use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::dashboard::window::TimeWindow;
use crate::types::{Loan, LoanStatus, Money, Payment};

/// Upper bound on points per series; longer spans widen the step.
pub const MAX_TIMELINE_POINTS: i64 = 400;

/// Cumulative portfolio figures as of one sample date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub total_lent: Money,
    pub total_received: Money,
    pub accrued_interest: Money,
    pub total_receivable: Money,
    pub active_loans: usize,
}

/// Sample cumulative totals from the window start up to `as_of`.
///
/// Only payments recorded against the given loans are counted. An empty loan
/// set yields an empty series.
pub fn portfolio_timeline(
    loans: &[&Loan],
    payments: &[Payment],
    window: TimeWindow,
    as_of: NaiveDate,
) -> Vec<TimelinePoint> {
    let Some(oldest) = loans.iter().map(|l| l.start_date).min() else {
        return Vec::new();
    };

    let (lookback, step) = window.timeline_sampling();
    let start = match lookback {
        Some(days) => calendar::days_before(as_of, days),
        None => oldest,
    };
    let span = (as_of - start).num_days();
    let step = step.max((span + MAX_TIMELINE_POINTS - 2) / (MAX_TIMELINE_POINTS - 1));

    let loan_ids: HashSet<&str> = loans.iter().map(|l| l.id.as_str()).collect();
    let payments: Vec<&Payment> = payments
        .iter()
        .filter(|p| loan_ids.contains(p.loan_id.as_str()))
        .collect();

    let mut points = Vec::new();
    let mut date = start;
    while date <= as_of {
        let started: Vec<&&Loan> = loans.iter().filter(|l| l.start_date <= date).collect();
        points.push(TimelinePoint {
            date,
            total_lent: started.iter().map(|l| l.principal).sum(),
            total_received: payments
                .iter()
                .filter(|p| p.date <= date)
                .map(|p| p.amount)
                .sum(),
            accrued_interest: started.iter().map(|l| l.accrued_interest).sum(),
            total_receivable: started
                .iter()
                .filter(|l| !l.is_settled())
                .map(|l| l.receivable())
                .sum(),
            active_loans: started
                .iter()
                .filter(|l| l.status == LoanStatus::Active)
                .count(),
        });
        date = match calendar::days_after(date, step) {
            Some(next) => next,
            None => break,
        };
    }
    points
}
