pub mod dashboard;
pub mod installments;
pub mod ledger;
pub mod reports;
