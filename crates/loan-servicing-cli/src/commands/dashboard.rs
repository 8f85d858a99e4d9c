use clap::{Args, ValueEnum};
use serde_json::Value;

use loan_servicing_core::dashboard::{
    build_dashboard, loans_in_window, portfolio_timeline, status_distribution, visible_loans,
    DashboardInput, TimeWindow,
};
use loan_servicing_core::{validate_records, Role, Viewer};

use crate::config::Context;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Administrator,
    Client,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Administrator => Role::Administrator,
            RoleArg::Client => Role::Client,
        }
    }
}

/// Window and viewer flags shared by the dashboard views.
/// Flags override the matching fields of the input file.
#[derive(Args)]
pub struct ViewArgs {
    /// Path to JSON input file: { loans, clients?, payments?, viewer?, window?, as_of?, policy? }
    #[arg(long)]
    pub input: Option<String>,

    /// Time window: 1d, 7d, 30d, 90d or all
    #[arg(long)]
    pub window: Option<TimeWindow>,

    /// Acting role
    #[arg(long)]
    pub role: Option<RoleArg>,

    /// Acting user id; with --role client only the linked client's loans are visible
    #[arg(long)]
    pub user_id: Option<String>,
}

/// Arguments for the full dashboard
#[derive(Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub view: ViewArgs,
}

/// Arguments for the status distribution
#[derive(Args)]
pub struct DistributionArgs {
    #[command(flatten)]
    pub view: ViewArgs,
}

/// Arguments for the portfolio timeline
#[derive(Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub view: ViewArgs,
}

fn read_dashboard_input(view: ViewArgs, ctx: &Context) -> Result<DashboardInput, Box<dyn std::error::Error>> {
    let raw = ctx.apply(input::read_records(view.input.as_deref())?)?;
    let mut dashboard_input: DashboardInput = serde_json::from_value(raw)?;

    if let Some(window) = view.window {
        dashboard_input.window = window;
    }
    if view.role.is_some() || view.user_id.is_some() {
        dashboard_input.viewer = Viewer {
            role: view.role.map(Role::from).unwrap_or(dashboard_input.viewer.role),
            user_id: view.user_id.or(dashboard_input.viewer.user_id),
        };
    }
    Ok(dashboard_input)
}

pub fn run_dashboard(args: DashboardArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let dashboard_input = read_dashboard_input(args.view, ctx)?;
    let result = build_dashboard(&dashboard_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_distribution(args: DistributionArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let d = read_dashboard_input(args.view, ctx)?;
    let loans = loans_in_window(&d.loans, &d.clients, &d.viewer, d.window, d.as_of);
    validate_records(loans.iter().copied(), &[])?;
    Ok(serde_json::to_value(status_distribution(loans))?)
}

pub fn run_timeline(args: TimelineArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let d = read_dashboard_input(args.view, ctx)?;
    let loans = visible_loans(&d.loans, &d.clients, &d.viewer);
    validate_records(loans.iter().copied(), &d.payments)?;
    let timeline = portfolio_timeline(&loans, &d.payments, d.window, d.as_of);
    Ok(serde_json::to_value(timeline)?)
}
