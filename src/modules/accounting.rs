//! Ledger entries.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::round_cents;
use crate::record::{records_from_json, Record};
use crate::validation::{FormRules, Rule};
use crate::EntityView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "accounting", rules = "form_rules")]
pub struct LedgerEntry {
    #[serde(default)]
    pub id: String,
    pub entry_type: EntryType,
    pub amount: f64,
    pub account: String,
    #[serde(default)]
    pub description: String,
    pub transaction_date: String,
    #[serde(default)]
    pub reference_number: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_status() -> String {
    "pending".into()
}

impl LedgerEntry {
    /// Amount with credits positive and debits negative.
    pub fn signed_amount(&self) -> f64 {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerSummary {
    pub credits: f64,
    pub debits: f64,
    pub balance: f64,
}

/// Credit and debit totals over completed entries.
pub fn summarize<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> LedgerSummary {
    let mut summary = LedgerSummary::default();
    for entry in entries.into_iter().filter(|e| e.status == "completed") {
        match entry.entry_type {
            EntryType::Credit => summary.credits += entry.amount,
            EntryType::Debit => summary.debits += entry.amount,
        }
    }
    summary.credits = round_cents(summary.credits);
    summary.debits = round_cents(summary.debits);
    summary.balance = round_cents(summary.credits - summary.debits);
    summary
}

pub fn form_rules() -> FormRules {
    FormRules::new()
        .field("entry_type", [Rule::Required])
        .field("amount", [Rule::Required, Rule::Positive])
        .field("account", [Rule::Required])
        .field("transaction_date", [Rule::Required])
}

pub fn seed() -> Vec<Record> {
    records_from_json(json!([
        {
            "id": "acc-001",
            "entry_type": "credit",
            "amount": 15119.78,
            "account": "Revenue - Sales",
            "description": "Sale to Tech Solutions Inc - SO-2024-001",
            "transaction_date": "2024-01-20T10:00:00Z",
            "reference_number": "SO-2024-001",
            "status": "completed",
            "created_at": "2024-01-20T10:00:00Z"
        },
        {
            "id": "acc-002",
            "entry_type": "debit",
            "amount": 59400.00,
            "account": "Expenses - Inventory Purchase",
            "description": "Purchase from Dell Technologies - PO-2024-001",
            "transaction_date": "2024-01-18T10:00:00Z",
            "reference_number": "PO-2024-001",
            "status": "completed",
            "created_at": "2024-01-18T10:00:00Z"
        },
        {
            "id": "acc-003",
            "entry_type": "credit",
            "amount": 20519.57,
            "account": "Revenue - Sales",
            "description": "Sale to Global Marketing Ltd - SO-2024-002",
            "transaction_date": "2024-01-21T14:30:00Z",
            "reference_number": "SO-2024-002",
            "status": "completed",
            "created_at": "2024-01-21T14:30:00Z"
        },
        {
            "id": "acc-004",
            "entry_type": "debit",
            "amount": 16848.00,
            "account": "Expenses - Inventory Purchase",
            "description": "Purchase from Office Supplies Inc - PO-2024-002",
            "transaction_date": "2024-01-19T11:30:00Z",
            "reference_number": "PO-2024-002",
            "status": "completed",
            "created_at": "2024-01-19T11:30:00Z"
        },
        {
            "id": "acc-005",
            "entry_type": "debit",
            "amount": 3500.00,
            "account": "Expenses - Office Rent",
            "description": "Monthly office rent payment",
            "transaction_date": "2024-01-01T09:00:00Z",
            "reference_number": "RENT-JAN-2024",
            "status": "completed",
            "created_at": "2024-01-01T09:00:00Z"
        },
        {
            "id": "acc-006",
            "entry_type": "debit",
            "amount": 15000.00,
            "account": "Expenses - Payroll",
            "description": "Employee salaries - January 2024",
            "transaction_date": "2024-01-31T10:00:00Z",
            "reference_number": "PAY-JAN-2024",
            "status": "pending",
            "created_at": "2024-01-31T10:00:00Z"
        }
    ]))
}
