//! Installment schedule derivation.
//!
//! A schedule is a view over one loan and its recorded payments: principal and
//! accrued interest are split evenly across the installments (no declining
//! balance weighting), each installment falls due one calendar month after the
//! previous one, and status is decided against an explicit `as_of` date.

use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::installments::summary::{summarize_installments, InstallmentSummary};
use crate::policy::{PaymentMatching, ServicingPolicy};
use crate::types::{with_metadata, ComputationOutput, Loan, Money, Payment};
use crate::LoanServicingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

/// One projected installment. Never persisted; recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position in the schedule.
    pub number: u32,
    pub due_date: NaiveDate,
    pub principal_amount: Money,
    pub interest_amount: Money,
    /// principal_amount + interest_amount
    pub total_amount: Money,
    pub status: InstallmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Money>,
}

impl Installment {
    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

/// Input for a full schedule computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub loan: Loan,
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub policy: ServicingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub loan_id: String,
    pub installments: Vec<Installment>,
    pub summary: InstallmentSummary,
    /// Installments still to fall due after `as_of`, ignoring payments.
    pub future_installments: Vec<Installment>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the installment schedule of a loan using calendar-month payment matching.
pub fn derive_installments(
    loan: &Loan,
    payments: &[Payment],
    as_of: NaiveDate,
) -> LoanServicingResult<Vec<Installment>> {
    derive_installments_with(loan, payments, as_of, PaymentMatching::default())
}

/// Derive the installment schedule of a loan with an explicit matching rule.
pub fn derive_installments_with(
    loan: &Loan,
    payments: &[Payment],
    as_of: NaiveDate,
    matching: PaymentMatching,
) -> LoanServicingResult<Vec<Installment>> {
    derive(loan, payments, as_of, matching).map(|(installments, _)| installments)
}

/// Installments of a multi-installment loan still to fall due after `as_of`.
/// Bullet loans have no future installments.
pub fn future_installments(loan: &Loan, as_of: NaiveDate) -> LoanServicingResult<Vec<Installment>> {
    if loan.effective_installments() <= 1 {
        loan.validate()?;
        return Ok(Vec::new());
    }
    let installments = derive_installments_with(loan, &[], as_of, PaymentMatching::CalendarMonth)?;
    Ok(installments
        .into_iter()
        .filter(|i| i.due_date > as_of)
        .collect())
}

/// Build the schedule, its summary and the remaining installments for one loan.
pub fn build_schedule(
    input: &ScheduleInput,
) -> LoanServicingResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.policy.validate()?;

    let (own, foreign): (Vec<Payment>, Vec<Payment>) = input
        .payments
        .iter()
        .cloned()
        .partition(|p| p.loan_id == input.loan.id);
    for p in &foreign {
        warnings.push(format!(
            "Payment {} belongs to loan {}, not {}; ignored",
            p.id, p.loan_id, input.loan.id
        ));
    }

    let (installments, attributed) =
        derive(&input.loan, &own, input.as_of, input.policy.payment_matching)?;

    if input.loan.effective_installments() > 1 {
        for p in own.iter().filter(|p| !attributed.contains(p.id.as_str())) {
            warnings.push(format!(
                "Payment {} on {} was not attributed to any installment",
                p.id, p.date
            ));
        }
    }

    let summary = summarize_installments(&installments);
    let future = future_installments(&input.loan, input.as_of)?;

    let output = ScheduleOutput {
        loan_id: input.loan.id.clone(),
        installments,
        summary,
        future_installments: future,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equal-split installment schedule with monthly due dates",
        &serde_json::json!({
            "loan_id": input.loan.id,
            "principal": input.loan.principal.to_string(),
            "accrued_interest": input.loan.accrued_interest.to_string(),
            "installment_count": input.loan.effective_installments(),
            "as_of": input.as_of.to_string(),
            "payment_matching": input.policy.payment_matching,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Returns the schedule and the ids of payments that were attributed.
fn derive<'p>(
    loan: &Loan,
    payments: &'p [Payment],
    as_of: NaiveDate,
    matching: PaymentMatching,
) -> LoanServicingResult<(Vec<Installment>, HashSet<&'p str>)> {
    loan.validate()?;
    payments.iter().try_for_each(Payment::validate)?;

    let count = loan.effective_installments();
    if count == 1 {
        return Ok((vec![bullet_installment(loan, as_of)], HashSet::new()));
    }

    let n = Decimal::from(count);
    let principal_share = loan.principal / n;
    let interest_share = loan.accrued_interest / n;

    let mut installments = Vec::with_capacity(count as usize);
    for number in 1..=count {
        let due_date = calendar::add_months(loan.start_date, number)?;
        installments.push(Installment {
            number,
            due_date,
            principal_amount: principal_share,
            interest_amount: interest_share,
            total_amount: principal_share + interest_share,
            status: status_by_date(due_date, as_of),
            paid_date: None,
            paid_amount: None,
        });
    }

    let attributed = match matching {
        PaymentMatching::CalendarMonth => match_by_calendar_month(&mut installments, payments),
        PaymentMatching::Sequential => match_sequentially(&mut installments, payments),
    };

    tracing::debug!(
        loan_id = %loan.id,
        installments = count,
        paid = attributed.len(),
        "derived installment schedule"
    );

    Ok((installments, attributed))
}

/// A loan without an installment plan is one installment due at maturity.
fn bullet_installment(loan: &Loan, as_of: NaiveDate) -> Installment {
    let total = loan.principal + loan.accrued_interest;
    let settled = loan.is_settled();
    Installment {
        number: 1,
        due_date: loan.due_date,
        principal_amount: loan.principal,
        interest_amount: loan.accrued_interest,
        total_amount: total,
        status: if settled {
            InstallmentStatus::Paid
        } else {
            status_by_date(loan.due_date, as_of)
        },
        paid_date: settled.then_some(loan.due_date),
        paid_amount: settled.then_some(total),
    }
}

fn status_by_date(due_date: NaiveDate, as_of: NaiveDate) -> InstallmentStatus {
    if due_date < as_of {
        InstallmentStatus::Overdue
    } else {
        InstallmentStatus::Pending
    }
}

fn mark_paid(installment: &mut Installment, payment: &Payment) {
    installment.status = InstallmentStatus::Paid;
    installment.paid_date = Some(payment.date);
    installment.paid_amount = Some(payment.amount);
}

/// Month/year matching only: two payments in the same month cannot both be
/// attributed, the first one in input order wins.
fn match_by_calendar_month<'p>(
    installments: &mut [Installment],
    payments: &'p [Payment],
) -> HashSet<&'p str> {
    let mut attributed = HashSet::new();
    for installment in installments.iter_mut() {
        if let Some(payment) = payments
            .iter()
            .find(|p| calendar::same_month(p.date, installment.due_date))
        {
            mark_paid(installment, payment);
            attributed.insert(payment.id.as_str());
        }
    }
    attributed
}

fn match_sequentially<'p>(
    installments: &mut [Installment],
    payments: &'p [Payment],
) -> HashSet<&'p str> {
    let mut ordered: Vec<&Payment> = payments.iter().collect();
    ordered.sort_by_key(|p| p.date);

    let mut attributed = HashSet::new();
    for (installment, payment) in installments.iter_mut().zip(ordered) {
        mark_paid(installment, payment);
        attributed.insert(payment.id.as_str());
    }
    attributed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InterestMode, LoanStatus, PaymentMethod, RateFrequency};
    use crate::LoanServicingError;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn six_month_loan() -> Loan {
        Loan {
            id: "L1".into(),
            client_id: "C1".into(),
            principal: dec!(5000),
            interest_rate: dec!(3.5),
            rate_frequency: RateFrequency::Monthly,
            interest_mode: InterestMode::Simple,
            start_date: d(2024, 1, 1),
            due_date: d(2024, 7, 1),
            installment_count: Some(6),
            status: LoanStatus::Active,
            outstanding_principal: dec!(5000),
            accrued_interest: dec!(875),
            total_value: dec!(5875),
            last_updated: d(2024, 1, 1),
            notes: None,
        }
    }

    fn payment(id: &str, date: NaiveDate, amount: Money) -> Payment {
        Payment {
            id: id.into(),
            loan_id: "L1".into(),
            date,
            amount,
            principal_portion: amount,
            interest_portion: Decimal::ZERO,
            method: PaymentMethod::Pix,
            notes: None,
        }
    }

    #[test]
    fn test_six_installments_split_evenly() {
        let schedule = derive_installments(&six_month_loan(), &[], d(2024, 4, 15)).unwrap();
        assert_eq!(schedule.len(), 6);
        for inst in &schedule {
            assert_eq!(inst.principal_amount.round_dp(2), dec!(833.33));
            assert_eq!(inst.interest_amount.round_dp(2), dec!(145.83));
            assert_eq!(inst.total_amount, inst.principal_amount + inst.interest_amount);
        }
        let dues: Vec<NaiveDate> = schedule.iter().map(|i| i.due_date).collect();
        assert_eq!(
            dues,
            vec![
                d(2024, 2, 1),
                d(2024, 3, 1),
                d(2024, 4, 1),
                d(2024, 5, 1),
                d(2024, 6, 1),
                d(2024, 7, 1)
            ]
        );
    }

    #[test]
    fn test_status_split_around_as_of() {
        let schedule = derive_installments(&six_month_loan(), &[], d(2024, 4, 15)).unwrap();
        let statuses: Vec<InstallmentStatus> = schedule.iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                InstallmentStatus::Overdue,
                InstallmentStatus::Overdue,
                InstallmentStatus::Overdue,
                InstallmentStatus::Pending,
                InstallmentStatus::Pending,
                InstallmentStatus::Pending
            ]
        );
    }

    #[test]
    fn test_due_on_as_of_is_pending() {
        let schedule = derive_installments(&six_month_loan(), &[], d(2024, 3, 1)).unwrap();
        assert_eq!(schedule[1].due_date, d(2024, 3, 1));
        assert_eq!(schedule[1].status, InstallmentStatus::Pending);
    }

    #[test]
    fn test_same_month_payment_marks_paid() {
        let payments = vec![payment("P1", d(2024, 3, 20), dec!(979.17))];
        let schedule = derive_installments(&six_month_loan(), &payments, d(2024, 4, 15)).unwrap();
        let march = &schedule[1];
        assert_eq!(march.status, InstallmentStatus::Paid);
        assert_eq!(march.paid_date, Some(d(2024, 3, 20)));
        assert_eq!(march.paid_amount, Some(dec!(979.17)));
        assert_eq!(schedule[0].status, InstallmentStatus::Overdue);
    }

    #[test]
    fn test_first_payment_in_input_order_wins() {
        let payments = vec![
            payment("P2", d(2024, 2, 25), dec!(200)),
            payment("P1", d(2024, 2, 3), dec!(100)),
        ];
        let schedule = derive_installments(&six_month_loan(), &payments, d(2024, 4, 15)).unwrap();
        assert_eq!(schedule[0].paid_amount, Some(dec!(200)));
    }

    #[test]
    fn test_sequential_matching_orders_by_date() {
        let payments = vec![
            payment("P2", d(2024, 4, 10), dec!(200)),
            payment("P1", d(2024, 4, 2), dec!(100)),
        ];
        let schedule = derive_installments_with(
            &six_month_loan(),
            &payments,
            d(2024, 4, 15),
            PaymentMatching::Sequential,
        )
        .unwrap();
        assert_eq!(schedule[0].paid_amount, Some(dec!(100)));
        assert_eq!(schedule[1].paid_amount, Some(dec!(200)));
        assert_eq!(schedule[2].status, InstallmentStatus::Overdue);
    }

    #[test]
    fn test_bullet_loan_single_installment() {
        let mut loan = six_month_loan();
        loan.installment_count = None;
        let schedule = derive_installments(&loan, &[], d(2024, 4, 15)).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].number, 1);
        assert_eq!(schedule[0].due_date, d(2024, 7, 1));
        assert_eq!(schedule[0].total_amount, dec!(5875));
        assert_eq!(schedule[0].status, InstallmentStatus::Pending);
    }

    #[test]
    fn test_settled_bullet_loan_is_paid_at_due_date() {
        let mut loan = six_month_loan();
        loan.installment_count = Some(1);
        loan.status = LoanStatus::Settled;
        loan.outstanding_principal = Decimal::ZERO;
        let schedule = derive_installments(&loan, &[], d(2024, 9, 1)).unwrap();
        assert_eq!(schedule[0].status, InstallmentStatus::Paid);
        assert_eq!(schedule[0].paid_date, Some(d(2024, 7, 1)));
        assert_eq!(schedule[0].paid_amount, Some(dec!(5875)));
    }

    #[test]
    fn test_negative_installment_count_is_rejected() {
        let mut loan = six_month_loan();
        loan.installment_count = Some(-3);
        let err = derive_installments(&loan, &[], d(2024, 4, 15)).unwrap_err();
        assert!(matches!(err, LoanServicingError::InvalidInput { .. }));
    }

    #[test]
    fn test_future_installments_skip_elapsed_ones() {
        let future = future_installments(&six_month_loan(), d(2024, 4, 15)).unwrap();
        let numbers: Vec<u32> = future.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![4, 5, 6]);
        assert!(future.iter().all(|i| i.status == InstallmentStatus::Pending));
    }

    #[test]
    fn test_build_schedule_warns_on_unattributed_payments() {
        let input = ScheduleInput {
            loan: six_month_loan(),
            payments: vec![
                payment("P1", d(2024, 2, 3), dec!(100)),
                payment("P2", d(2024, 2, 25), dec!(100)),
            ],
            as_of: d(2024, 4, 15),
            policy: ServicingPolicy::default(),
        };
        let out = build_schedule(&input).unwrap();
        assert_eq!(out.result.summary.paid, 1);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("P2"));
    }
}
