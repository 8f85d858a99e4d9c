pub mod calendar;
pub mod error;
pub mod policy;
pub mod types;

#[cfg(feature = "installments")]
pub mod installments;

#[cfg(feature = "dashboard")]
pub mod dashboard;

#[cfg(feature = "reports")]
pub mod reports;

#[cfg(feature = "ledger")]
pub mod ledger;

pub use error::LoanServicingError;
pub use policy::{PaymentMatching, ServicingPolicy};
pub use types::*;

/// Standard result type for all loan-servicing operations
pub type LoanServicingResult<T> = Result<T, LoanServicingError>;
