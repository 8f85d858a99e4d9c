pub mod distribution;
pub mod metrics;
pub mod timeline;
pub mod window;

pub use distribution::{status_distribution, StatusSlice};
pub use metrics::{compute_dashboard_metrics, DashboardMetrics, DueSoonLoan};
pub use timeline::{portfolio_timeline, TimelinePoint};
pub use window::{loans_in_window, visible_loans, TimeWindow};

use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::policy::ServicingPolicy;
use crate::types::{validate_records, with_metadata, Client, ComputationOutput, Loan, Payment, Viewer};
use crate::LoanServicingResult;

/// Input for the dashboard view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub clients: Vec<Client>,
    /// Only needed for the timeline's received series.
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub viewer: Viewer,
    #[serde(default)]
    pub window: TimeWindow,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub policy: ServicingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOutput {
    pub metrics: DashboardMetrics,
    pub status_distribution: Vec<StatusSlice>,
    pub timeline: Vec<TimelinePoint>,
}

/// KPIs, status distribution and timeline for one viewer and window.
pub fn build_dashboard(
    input: &DashboardInput,
) -> LoanServicingResult<ComputationOutput<DashboardOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let metrics = compute_dashboard_metrics(
        &input.loans,
        &input.clients,
        &input.viewer,
        input.window,
        input.as_of,
        &input.policy,
    )?;

    let in_window = loans_in_window(
        &input.loans,
        &input.clients,
        &input.viewer,
        input.window,
        input.as_of,
    );
    let status_distribution = status_distribution(in_window.iter().copied());

    let visible = visible_loans(&input.loans, &input.clients, &input.viewer);
    validate_records(visible.iter().copied(), &input.payments)?;
    let timeline = portfolio_timeline(&visible, &input.payments, input.window, input.as_of);

    if visible.len() > in_window.len() {
        warnings.push(format!(
            "{} loan(s) started before the {} window and are excluded from the KPIs",
            visible.len() - in_window.len(),
            input.window
        ));
    }

    let output = DashboardOutput {
        metrics,
        status_distribution,
        timeline,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio dashboard — window-filtered KPIs, status mix, cumulative timeline",
        &serde_json::json!({
            "window": input.window,
            "as_of": input.as_of.to_string(),
            "role": input.viewer.role,
            "loans_received": input.loans.len(),
            "monthly_interest_divisor": input.policy.monthly_interest_divisor.to_string(),
            "day_count_basis": input.policy.day_count_basis.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
