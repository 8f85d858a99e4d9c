use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanServicingError;
use crate::LoanServicingResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Interest rates as stored on the loan record (percentage, e.g. 5 = 5%).
pub type Rate = Decimal;

/// Upper bound on monthly installments a single loan may carry (100 years).
pub const MAX_INSTALLMENTS: i64 = 1200;

/// Largest amount accepted on any loan or payment field.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

/// Largest interest rate accepted, in percent.
pub const MAX_RATE: Rate = dec!(1000000);

/// Record dates must fall within these years.
pub const MIN_RECORD_YEAR: i32 = 1900;
pub const MAX_RECORD_YEAR: i32 = 2199;

fn check_amount(field: &str, owner: &str, value: Money) -> LoanServicingResult<()> {
    if value < Decimal::ZERO {
        return Err(LoanServicingError::InvalidInput {
            field: field.into(),
            reason: format!("{owner} {field} cannot be negative."),
        });
    }
    if value > MAX_AMOUNT {
        return Err(LoanServicingError::InvalidInput {
            field: field.into(),
            reason: format!("{owner} {field} exceeds {MAX_AMOUNT}."),
        });
    }
    Ok(())
}

fn check_date(field: &str, owner: &str, date: NaiveDate) -> LoanServicingResult<()> {
    if !(MIN_RECORD_YEAR..=MAX_RECORD_YEAR).contains(&date.year()) {
        return Err(LoanServicingError::InvalidInput {
            field: field.into(),
            reason: format!(
                "{owner} {field} {date} is outside {MIN_RECORD_YEAR}-{MAX_RECORD_YEAR}."
            ),
        });
    }
    Ok(())
}

/// Lifecycle state of a loan as recorded by the payment side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Active,
    Overdue,
    Settled,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 3] = [LoanStatus::Active, LoanStatus::Overdue, LoanStatus::Settled];

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Settled => "settled",
        }
    }
}

/// Period the interest rate is quoted for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFrequency {
    #[default]
    Monthly,
    Annual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestMode {
    #[default]
    Simple,
    Compound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Pix,
    BankTransfer,
    Cheque,
    Card,
}

/// A loan record as persisted by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub client_id: String,
    /// Original amount lent.
    pub principal: Money,
    /// Percentage rate per `rate_frequency`.
    pub interest_rate: Rate,
    #[serde(default)]
    pub rate_frequency: RateFrequency,
    #[serde(default)]
    pub interest_mode: InterestMode,
    pub start_date: NaiveDate,
    /// Final maturity; the single due date for bullet loans.
    pub due_date: NaiveDate,
    /// Number of monthly installments. Absent, 0 or 1 means a single bullet payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<i64>,
    pub status: LoanStatus,
    pub outstanding_principal: Money,
    pub accrued_interest: Money,
    pub total_value: Money,
    pub last_updated: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Loan {
    /// Reject structurally invalid records instead of letting them leak into sums.
    pub fn validate(&self) -> LoanServicingResult<()> {
        if let Some(count) = self.installment_count {
            if count < 0 {
                return Err(LoanServicingError::InvalidInput {
                    field: "installment_count".into(),
                    reason: format!("Loan {} has a negative installment count ({count}).", self.id),
                });
            }
            if count > MAX_INSTALLMENTS {
                return Err(LoanServicingError::InvalidInput {
                    field: "installment_count".into(),
                    reason: format!(
                        "Loan {} has {count} installments; at most {MAX_INSTALLMENTS} are supported.",
                        self.id
                    ),
                });
            }
        }
        let owner = format!("Loan {}", self.id);
        if self.principal <= Decimal::ZERO {
            return Err(LoanServicingError::InvalidInput {
                field: "principal".into(),
                reason: format!("{owner} principal must be positive."),
            });
        }
        check_amount("principal", &owner, self.principal)?;
        check_amount("outstanding_principal", &owner, self.outstanding_principal)?;
        check_amount("accrued_interest", &owner, self.accrued_interest)?;
        if self.interest_rate < Decimal::ZERO || self.interest_rate > MAX_RATE {
            return Err(LoanServicingError::InvalidInput {
                field: "interest_rate".into(),
                reason: format!("{owner} interest rate must be between 0 and {MAX_RATE}."),
            });
        }
        check_date("start_date", &owner, self.start_date)?;
        check_date("due_date", &owner, self.due_date)?;
        Ok(())
    }

    /// Installment count after collapsing absent/0/1 into a single bullet.
    pub fn effective_installments(&self) -> u32 {
        match self.installment_count {
            Some(n) if n > 1 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => 1,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status == LoanStatus::Settled
    }

    /// Outstanding principal plus accrued interest.
    pub fn receivable(&self) -> Money {
        self.outstanding_principal + self.accrued_interest
    }
}

/// A payment recorded against a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub loan_id: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Payment {
    pub fn validate(&self) -> LoanServicingResult<()> {
        let owner = format!("Payment {}", self.id);
        check_amount("amount", &owner, self.amount)?;
        check_amount("principal_portion", &owner, self.principal_portion)?;
        check_amount("interest_portion", &owner, self.interest_portion)?;
        check_date("date", &owner, self.date)
    }
}

/// Check every loan and payment before they are summed.
pub fn validate_records<'a>(
    loans: impl IntoIterator<Item = &'a Loan>,
    payments: &[Payment],
) -> LoanServicingResult<()> {
    for loan in loans {
        loan.validate()?;
    }
    payments.iter().try_for_each(Payment::validate)
}

/// Borrower details needed to label loans in views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Login account of the borrower, when they have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Client {
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    #[default]
    Client,
}

/// The acting user. Clients only ever see their own loans; a missing viewer
/// is an anonymous client and sees nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Viewer {
    pub fn administrator() -> Self {
        Viewer {
            role: Role::Administrator,
            user_id: None,
        }
    }

    pub fn client(user_id: impl Into<String>) -> Self {
        Viewer {
            role: Role::Client,
            user_id: Some(user_id.into()),
        }
    }

    /// Client ids whose loans this viewer may see; `None` means all of them.
    ///
    /// A client viewer's `user_id` is matched against `Client::user_id`. A
    /// `user_id` that is itself a client id also names that client.
    pub fn visible_clients<'a>(&'a self, clients: &'a [Client]) -> Option<HashSet<&'a str>> {
        if self.role == Role::Administrator {
            return None;
        }
        let mut ids = HashSet::new();
        if let Some(user_id) = self.user_id.as_deref() {
            ids.insert(user_id);
            ids.extend(
                clients
                    .iter()
                    .filter(|c| c.user_id.as_deref() == Some(user_id))
                    .map(|c| c.id.as_str()),
            );
        }
        Some(ids)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan() -> Loan {
        Loan {
            id: "L1".into(),
            client_id: "C1".into(),
            principal: dec!(1000),
            interest_rate: dec!(5),
            rate_frequency: RateFrequency::Monthly,
            interest_mode: InterestMode::Simple,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            installment_count: None,
            status: LoanStatus::Active,
            outstanding_principal: dec!(1000),
            accrued_interest: dec!(50),
            total_value: dec!(1050),
            last_updated: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_negative_installment_count_rejected() {
        let mut l = loan();
        l.installment_count = Some(-2);
        match l.validate() {
            Err(LoanServicingError::InvalidInput { field, .. }) => {
                assert_eq!(field, "installment_count")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_principal_rejected() {
        let mut l = loan();
        l.principal = Decimal::ZERO;
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_effective_installments_collapses_small_counts() {
        let mut l = loan();
        assert_eq!(l.effective_installments(), 1);
        l.installment_count = Some(0);
        assert_eq!(l.effective_installments(), 1);
        l.installment_count = Some(1);
        assert_eq!(l.effective_installments(), 1);
        l.installment_count = Some(12);
        assert_eq!(l.effective_installments(), 12);
    }

    fn client(id: &str, user_id: Option<&str>) -> Client {
        Client {
            id: id.into(),
            full_name: "Ana Souza".into(),
            document: String::new(),
            phone: String::new(),
            email: String::new(),
            user_id: user_id.map(str::to_string),
        }
    }

    #[test]
    fn test_client_viewer_resolved_through_user_link() {
        let clients = vec![client("client-doc-123", Some("auth-uid-abc")), client("C2", None)];
        let viewer = Viewer::client("auth-uid-abc");
        let scope = viewer.visible_clients(&clients).unwrap();
        assert!(scope.contains("client-doc-123"));
        assert!(!scope.contains("C2"));
        let direct_viewer = Viewer::client("C2");
        let direct = direct_viewer.visible_clients(&clients).unwrap();
        assert!(direct.contains("C2"));
        assert!(Viewer::administrator().visible_clients(&clients).is_none());
    }

    #[test]
    fn test_missing_viewer_is_least_privileged() {
        let viewer: Viewer = serde_json::from_str("{}").unwrap();
        assert_eq!(viewer.role, Role::Client);
        assert!(viewer.visible_clients(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_records_rejected() {
        let mut l = loan();
        l.principal = dec!(50000000000000000000000000000);
        l.outstanding_principal = l.principal;
        assert!(l.validate().is_err());

        let mut l = loan();
        l.interest_rate = dec!(10000000);
        assert!(l.validate().is_err());

        let mut l = loan();
        l.start_date = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        assert!(l.validate().is_err());

        let p = Payment {
            id: "P1".into(),
            loan_id: "L1".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            amount: dec!(-10),
            principal_portion: Decimal::ZERO,
            interest_portion: Decimal::ZERO,
            method: PaymentMethod::Cash,
            notes: None,
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_loan_deserializes_with_defaults() {
        let json = r#"{
            "id": "L9", "client_id": "C9", "principal": "2500", "interest_rate": 3,
            "start_date": "2024-03-10", "due_date": "2024-09-10", "status": "overdue",
            "outstanding_principal": 2500, "accrued_interest": "75.50",
            "total_value": 2575.5, "last_updated": "2024-03-10"
        }"#;
        let l: Loan = serde_json::from_str(json).unwrap();
        assert_eq!(l.status, LoanStatus::Overdue);
        assert_eq!(l.rate_frequency, RateFrequency::Monthly);
        assert_eq!(l.installment_count, None);
        assert_eq!(l.accrued_interest, dec!(75.50));
    }
}
