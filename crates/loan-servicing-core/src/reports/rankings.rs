use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Client, Loan, Money, Payment};

/// One client's position in a ranking chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRanking {
    pub client_id: String,
    /// First name only, as shown on chart axes.
    pub name: String,
    pub value: Money,
    pub count: usize,
}

/// Clients by total principal lent, largest first.
pub fn client_lending_ranking(clients: &[Client], loans: &[&Loan], limit: usize) -> Vec<ClientRanking> {
    let rows = clients.iter().map(|client| {
        let own: Vec<&&Loan> = loans.iter().filter(|l| l.client_id == client.id).collect();
        ClientRanking {
            client_id: client.id.clone(),
            name: client.first_name().to_string(),
            value: own.iter().map(|l| l.principal).sum(),
            count: own.len(),
        }
    });
    shape(rows, limit)
}

/// Clients by total amount received across their loans, largest first.
pub fn client_receipts_ranking(
    clients: &[Client],
    loans: &[&Loan],
    payments: &[Payment],
    limit: usize,
) -> Vec<ClientRanking> {
    let owner: HashMap<&str, &str> = loans
        .iter()
        .map(|l| (l.id.as_str(), l.client_id.as_str()))
        .collect();

    let rows = clients.iter().map(|client| {
        let received: Vec<&Payment> = payments
            .iter()
            .filter(|p| owner.get(p.loan_id.as_str()) == Some(&client.id.as_str()))
            .collect();
        ClientRanking {
            client_id: client.id.clone(),
            name: client.first_name().to_string(),
            value: received.iter().map(|p| p.amount).sum(),
            count: received.len(),
        }
    });
    shape(rows, limit)
}

fn shape(rows: impl Iterator<Item = ClientRanking>, limit: usize) -> Vec<ClientRanking> {
    let mut rows: Vec<ClientRanking> = rows.filter(|r| r.value > Money::ZERO).collect();
    rows.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.client_id.cmp(&b.client_id))
    });
    rows.truncate(limit);
    rows
}
