use chrono::NaiveDate;
use loan_servicing_core::dashboard::{
    build_dashboard, compute_dashboard_metrics, DashboardInput, TimeWindow,
};
use loan_servicing_core::{
    Client, InterestMode, Loan, LoanStatus, RateFrequency, ServicingPolicy, Viewer,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn loan(id: &str, client: &str, status: LoanStatus, start: NaiveDate, due: NaiveDate) -> Loan {
    let outstanding = if status == LoanStatus::Settled {
        Decimal::ZERO
    } else {
        dec!(1000)
    };
    Loan {
        id: id.into(),
        client_id: client.into(),
        principal: dec!(1000),
        interest_rate: dec!(5),
        rate_frequency: RateFrequency::Monthly,
        interest_mode: InterestMode::Simple,
        start_date: start,
        due_date: due,
        installment_count: None,
        status,
        outstanding_principal: outstanding,
        accrued_interest: dec!(100),
        total_value: dec!(1100),
        last_updated: start,
        notes: None,
    }
}

fn client(id: &str, name: &str) -> Client {
    Client {
        id: id.into(),
        full_name: name.into(),
        document: String::new(),
        phone: String::new(),
        email: String::new(),
        user_id: None,
    }
}

fn admin_metrics(loans: &[Loan], window: TimeWindow, as_of: NaiveDate) -> loan_servicing_core::dashboard::DashboardMetrics {
    compute_dashboard_metrics(
        loans,
        &[],
        &Viewer::administrator(),
        window,
        as_of,
        &ServicingPolicy::default(),
    )
    .unwrap()
}

#[test]
fn test_receivable_skips_settled_loans() {
    let as_of = d(2024, 6, 30);
    let mut settled = loan("S", "C1", LoanStatus::Settled, d(2024, 1, 1), d(2024, 5, 1));
    settled.accrued_interest = Decimal::ZERO;
    let mut active = loan("A", "C1", LoanStatus::Active, d(2024, 2, 1), d(2024, 9, 1));
    active.outstanding_principal = dec!(2000);
    active.accrued_interest = dec!(300);

    let m = admin_metrics(&[settled, active], TimeWindow::All, as_of);
    assert_eq!(m.total_receivable, dec!(2300));
    assert_eq!(m.total_loans, 2);
    assert_eq!(m.settled_loans, 1);
    assert_eq!(m.active_loans, 1);
    assert_eq!(m.total_outstanding_principal, dec!(2000));
}

#[test]
fn test_window_filters_by_start_date() {
    let as_of = d(2024, 6, 30);
    let loans = vec![
        loan("recent", "C1", LoanStatus::Active, d(2024, 6, 25), d(2024, 12, 1)),
        loan("month", "C1", LoanStatus::Active, d(2024, 6, 5), d(2024, 12, 1)),
        loan("quarter", "C1", LoanStatus::Overdue, d(2024, 4, 15), d(2024, 5, 15)),
        loan("old", "C1", LoanStatus::Active, d(2023, 1, 1), d(2024, 12, 1)),
    ];

    let expected = [
        (TimeWindow::OneDay, 0),
        (TimeWindow::SevenDays, 1),
        (TimeWindow::ThirtyDays, 2),
        (TimeWindow::NinetyDays, 3),
        (TimeWindow::All, 4),
    ];
    for (window, count) in expected {
        let m = admin_metrics(&loans, window, as_of);
        assert_eq!(m.total_loans, count, "window {window}");
        assert_eq!(m.total_principal_lent, dec!(1000) * Decimal::from(count));
    }
}

#[test]
fn test_due_soon_overdue_before_upcoming_and_capped() {
    let as_of = d(2024, 6, 15);
    let mut loans = vec![
        loan("B", "C2", LoanStatus::Active, d(2024, 1, 1), d(2024, 6, 17)),
        loan("A", "C1", LoanStatus::Active, d(2024, 1, 1), d(2024, 6, 10)),
        loan("late-but-flagged", "C1", LoanStatus::Overdue, d(2024, 1, 1), d(2024, 6, 1)),
    ];
    for i in 0..12 {
        loans.push(loan(
            &format!("bulk-{i:02}"),
            "C3",
            LoanStatus::Active,
            d(2024, 1, 1),
            d(2024, 6, 20),
        ));
    }

    let clients = vec![client("C1", "Ana Souza"), client("C2", "Bruno Lima")];
    let m = compute_dashboard_metrics(
        &loans,
        &clients,
        &Viewer::administrator(),
        TimeWindow::All,
        as_of,
        &ServicingPolicy::default(),
    )
    .unwrap();

    assert_eq!(m.upcoming_due_soon.len(), 10);
    assert_eq!(m.upcoming_due_soon[0].loan.id, "A");
    assert!(m.upcoming_due_soon[0].is_overdue);
    assert_eq!(
        m.upcoming_due_soon[0].client.as_ref().map(|c| c.full_name.as_str()),
        Some("Ana Souza")
    );
    assert_eq!(m.upcoming_due_soon[1].loan.id, "B");
    assert!(m.upcoming_due_soon[2..].iter().all(|e| e.client.is_none()));
    assert!(m.upcoming_due_soon.iter().all(|e| e.loan.status == LoanStatus::Active));
}

#[test]
fn test_client_viewer_sees_own_loans_only() {
    let as_of = d(2024, 6, 30);
    let loans = vec![
        loan("mine", "C1", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1)),
        loan("theirs", "C2", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1)),
    ];
    let m = compute_dashboard_metrics(
        &loans,
        &[],
        &Viewer::client("C1"),
        TimeWindow::All,
        as_of,
        &ServicingPolicy::default(),
    )
    .unwrap();
    assert_eq!(m.total_loans, 1);
    assert_eq!(m.total_principal_lent, dec!(1000));
}

#[test]
fn test_invalid_loan_rejected() {
    let mut bad = loan("bad", "C1", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1));
    bad.principal = dec!(-5);
    let result = compute_dashboard_metrics(
        &[bad],
        &[],
        &Viewer::administrator(),
        TimeWindow::All,
        d(2024, 6, 30),
        &ServicingPolicy::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_build_dashboard_reports_excluded_loans() {
    let input = DashboardInput {
        loans: vec![
            loan("new", "C1", LoanStatus::Active, d(2024, 6, 20), d(2024, 12, 1)),
            loan("old", "C1", LoanStatus::Active, d(2023, 6, 20), d(2024, 12, 1)),
        ],
        clients: vec![],
        payments: vec![],
        viewer: Viewer::administrator(),
        window: TimeWindow::ThirtyDays,
        as_of: d(2024, 6, 30),
        policy: ServicingPolicy::default(),
    };
    let out = build_dashboard(&input).unwrap();
    assert_eq!(out.result.metrics.total_loans, 1);
    assert_eq!(out.result.status_distribution[0].count, 1);
    assert_eq!(out.result.status_distribution[0].percentage, dec!(100));
    // 30 days back in steps of 2: 16 samples, all after the old loan started
    assert_eq!(out.result.timeline.len(), 16);
    assert_eq!(out.result.timeline[0].total_lent, dec!(1000));
    assert_eq!(out.result.timeline.last().unwrap().total_lent, dec!(2000));
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_client_viewer_resolved_from_login_account() {
    let as_of = d(2024, 6, 30);
    let loans = vec![
        loan("L1", "client-doc-123", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1)),
        loan("L2", "client-doc-456", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1)),
    ];
    let mut ana = client("client-doc-123", "Ana Souza");
    ana.user_id = Some("auth-uid-abc".into());
    let clients = vec![ana, client("client-doc-456", "Bruno Lima")];

    let m = compute_dashboard_metrics(
        &loans,
        &clients,
        &Viewer::client("auth-uid-abc"),
        TimeWindow::All,
        as_of,
        &ServicingPolicy::default(),
    )
    .unwrap();
    assert_eq!(m.total_loans, 1);
    assert_eq!(m.total_principal_lent, dec!(1000));
}

#[test]
fn test_unidentified_client_sees_nothing() {
    let loans = vec![loan("L1", "C1", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1))];
    let m = compute_dashboard_metrics(
        &loans,
        &[],
        &Viewer::default(),
        TimeWindow::All,
        d(2024, 6, 30),
        &ServicingPolicy::default(),
    )
    .unwrap();
    assert_eq!(m.total_loans, 0);
    assert_eq!(m.total_receivable, Decimal::ZERO);
}

#[test]
fn test_oversized_amounts_rejected_instead_of_overflowing() {
    let mut a = loan("A", "C1", LoanStatus::Active, d(2024, 6, 1), d(2024, 12, 1));
    a.principal = dec!(50000000000000000000000000000);
    a.outstanding_principal = a.principal;
    let mut b = a.clone();
    b.id = "B".into();
    let result = compute_dashboard_metrics(
        &[a, b],
        &[],
        &Viewer::administrator(),
        TimeWindow::All,
        d(2024, 6, 30),
        &ServicingPolicy::default(),
    );
    assert!(matches!(
        result,
        Err(loan_servicing_core::LoanServicingError::InvalidInput { .. })
    ));
}
