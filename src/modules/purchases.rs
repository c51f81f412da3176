//! Purchase orders.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::sales::{LineItem, OrderTotals, TAX_RATE};
use crate::record::{records_from_json, Record};
use crate::validation::{FormRules, Rule};
use crate::EntityView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "purchases", rules = "form_rules")]
pub struct PurchaseOrder {
    #[serde(default)]
    pub id: String,
    pub order_number: String,
    pub vendor_name: String,
    #[serde(default)]
    pub vendor_email: String,
    pub order_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_status() -> String {
    "draft".into()
}

impl PurchaseOrder {
    pub fn recalculate(&mut self) {
        let totals = OrderTotals::compute(&self.items, TAX_RATE);
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.status.as_str(), "received" | "cancelled")
    }
}

pub fn form_rules() -> FormRules {
    FormRules::new()
        .field("order_number", [Rule::Required])
        .field("vendor_name", [Rule::Required])
        .field("vendor_email", [Rule::Email])
        .field("order_date", [Rule::Required])
        .field("total", [Rule::NonNegative])
}

pub fn seed() -> Vec<Record> {
    records_from_json(json!([
        {
            "id": "pur-001",
            "order_number": "PO-2024-001",
            "vendor_name": "Dell Technologies",
            "vendor_email": "sales@dell.com",
            "order_date": "2024-01-18T10:00:00Z",
            "expected_delivery": "2024-02-01T10:00:00Z",
            "status": "placed",
            "items": [
                { "name": "Laptop Computer - Dell XPS 15", "quantity": 50, "unit_price": 1100.00 }
            ],
            "subtotal": 55000.00,
            "tax": 4400.00,
            "total": 59400.00,
            "created_at": "2024-01-18T10:00:00Z",
            "updated_at": "2024-01-18T14:30:00Z"
        },
        {
            "id": "pur-002",
            "order_number": "PO-2024-002",
            "vendor_name": "Office Supplies Inc",
            "vendor_email": "orders@officesupplies.com",
            "order_date": "2024-01-19T11:30:00Z",
            "expected_delivery": "2024-01-28T11:30:00Z",
            "status": "received",
            "items": [
                { "name": "Office Chair - Ergonomic Executive", "quantity": 30, "unit_price": 280.00 },
                { "name": "Desk - Standing Adjustable", "quantity": 15, "unit_price": 480.00 }
            ],
            "subtotal": 15600.00,
            "tax": 1248.00,
            "total": 16848.00,
            "created_at": "2024-01-19T11:30:00Z",
            "updated_at": "2024-01-28T09:00:00Z"
        },
        {
            "id": "pur-003",
            "order_number": "PO-2024-003",
            "vendor_name": "Logitech",
            "vendor_email": "b2b@logitech.com",
            "order_date": "2024-01-20T14:00:00Z",
            "expected_delivery": "2024-01-30T14:00:00Z",
            "status": "draft",
            "items": [
                { "name": "Wireless Mouse - Logitech MX Master 3", "quantity": 100, "unit_price": 75.00 }
            ],
            "subtotal": 7500.00,
            "tax": 600.00,
            "total": 8100.00,
            "created_at": "2024-01-20T14:00:00Z",
            "updated_at": "2024-01-20T14:00:00Z"
        }
    ]))
}
