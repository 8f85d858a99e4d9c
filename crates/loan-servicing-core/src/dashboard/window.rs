use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::LoanServicingError;
use crate::types::{Client, Loan, Viewer};

/// Dashboard filter selecting loans by how recently they started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            TimeWindow::OneDay => Some(1),
            TimeWindow::SevenDays => Some(7),
            TimeWindow::ThirtyDays => Some(30),
            TimeWindow::NinetyDays => Some(90),
            TimeWindow::All => None,
        }
    }

    /// Earliest start date still inside the window.
    pub fn cutoff(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        self.lookback_days()
            .map(|days| calendar::days_before(as_of, days))
    }

    pub fn contains(&self, start_date: NaiveDate, as_of: NaiveDate) -> bool {
        self.cutoff(as_of).map_or(true, |cutoff| start_date >= cutoff)
    }

    /// Timeline sampling: days to look back (None = since the oldest loan) and step in days.
    pub fn timeline_sampling(&self) -> (Option<i64>, i64) {
        match self {
            TimeWindow::OneDay | TimeWindow::SevenDays => (Some(7), 1),
            TimeWindow::ThirtyDays => (Some(30), 2),
            TimeWindow::NinetyDays => (Some(90), 7),
            TimeWindow::All => (None, 30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::OneDay => "1d",
            TimeWindow::SevenDays => "7d",
            TimeWindow::ThirtyDays => "30d",
            TimeWindow::NinetyDays => "90d",
            TimeWindow::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = LoanServicingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(TimeWindow::OneDay),
            "7d" => Ok(TimeWindow::SevenDays),
            "30d" => Ok(TimeWindow::ThirtyDays),
            "90d" => Ok(TimeWindow::NinetyDays),
            "all" => Ok(TimeWindow::All),
            other => Err(LoanServicingError::InvalidInput {
                field: "window".into(),
                reason: format!("Unknown time window '{other}'; expected 1d, 7d, 30d, 90d or all."),
            }),
        }
    }
}

/// Loans the viewer may see, regardless of window.
pub fn visible_loans<'a>(loans: &'a [Loan], clients: &[Client], viewer: &Viewer) -> Vec<&'a Loan> {
    let scope = viewer.visible_clients(clients);
    loans.iter().filter(|l| in_scope(scope.as_ref(), l)).collect()
}

/// Loans the viewer may see that started inside the window.
pub fn loans_in_window<'a>(
    loans: &'a [Loan],
    clients: &[Client],
    viewer: &Viewer,
    window: TimeWindow,
    as_of: NaiveDate,
) -> Vec<&'a Loan> {
    let scope = viewer.visible_clients(clients);
    loans
        .iter()
        .filter(|l| in_scope(scope.as_ref(), l) && window.contains(l.start_date, as_of))
        .collect()
}

fn in_scope(scope: Option<&HashSet<&str>>, loan: &Loan) -> bool {
    scope.map_or(true, |ids| ids.contains(loan.client_id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_window_cutoff_is_inclusive() {
        let as_of = d(2024, 4, 30);
        assert!(TimeWindow::ThirtyDays.contains(d(2024, 3, 31), as_of));
        assert!(!TimeWindow::ThirtyDays.contains(d(2024, 3, 30), as_of));
        assert!(TimeWindow::All.contains(d(1999, 1, 1), as_of));
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        for w in ["1d", "7d", "30d", "90d", "all"] {
            assert_eq!(w.parse::<TimeWindow>().unwrap().to_string(), w);
        }
        assert!("2w".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_window_serde_names() {
        let w: TimeWindow = serde_json::from_str("\"90d\"").unwrap();
        assert_eq!(w, TimeWindow::NinetyDays);
        assert_eq!(serde_json::to_string(&TimeWindow::All).unwrap(), "\"all\"");
    }
}
