pub mod agenda;
pub mod schedule;
pub mod summary;

pub use agenda::{
    build_agenda, installment_agenda, AgendaInput, DueUrgency, InstallmentAgenda,
    ScheduledInstallment,
};
pub use schedule::{
    build_schedule, derive_installments, derive_installments_with, future_installments,
    Installment, InstallmentStatus, ScheduleInput, ScheduleOutput,
};
pub use summary::{summarize_installments, InstallmentSummary};

use std::collections::HashMap;

use crate::types::Payment;

/// Group payments by the loan they were recorded against, keeping input order.
pub(crate) fn payments_by_loan(payments: &[Payment]) -> HashMap<&str, Vec<Payment>> {
    let mut grouped: HashMap<&str, Vec<Payment>> = HashMap::new();
    for p in payments {
        grouped.entry(p.loan_id.as_str()).or_default().push(p.clone());
    }
    grouped
}
