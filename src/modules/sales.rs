//! Sales orders.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::round_cents;
use crate::record::{records_from_json, Record};
use crate::validation::{FormRules, Rule};
use crate::EntityView;

/// Sales tax applied to order subtotals.
pub const TAX_RATE: f64 = 0.08;

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Inventory item id, when the line refers to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl LineItem {
    pub fn amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl OrderTotals {
    pub fn compute(items: &[LineItem], tax_rate: f64) -> Self {
        let subtotal = round_cents(items.iter().map(LineItem::amount).sum());
        let tax = round_cents(subtotal * tax_rate);
        Self {
            subtotal,
            tax,
            total: round_cents(subtotal + tax),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "sales", rules = "form_rules")]
pub struct SalesOrder {
    #[serde(default)]
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    pub order_date: String,
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

impl SalesOrder {
    /// Recompute subtotal, tax and total from the line items.
    pub fn recalculate(&mut self) {
        let totals = OrderTotals::compute(&self.items, TAX_RATE);
        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.total = totals.total;
    }
}

pub fn form_rules() -> FormRules {
    FormRules::new()
        .field("order_number", [Rule::Required])
        .field("customer_name", [Rule::Required])
        .field("customer_email", [Rule::Email])
        .field("order_date", [Rule::Required])
        .field("total", [Rule::NonNegative])
}

pub fn seed() -> Vec<Record> {
    records_from_json(json!([
        {
            "id": "sale-001",
            "order_number": "SO-2024-001",
            "customer_name": "Tech Solutions Inc",
            "customer_email": "contact@techsolutions.com",
            "order_date": "2024-01-20T10:00:00Z",
            "status": "confirmed",
            "items": [
                { "id": "inv-001", "name": "Laptop Computer - Dell XPS 15", "quantity": 10, "unit_price": 1299.99 },
                { "id": "inv-003", "name": "Wireless Mouse - Logitech MX Master 3", "quantity": 10, "unit_price": 99.99 }
            ],
            "subtotal": 13999.80,
            "tax": 1119.98,
            "total": 15119.78,
            "created_at": "2024-01-20T10:00:00Z",
            "updated_at": "2024-01-20T15:30:00Z"
        },
        {
            "id": "sale-002",
            "order_number": "SO-2024-002",
            "customer_name": "Global Marketing Ltd",
            "customer_email": "orders@globalmarketing.com",
            "order_date": "2024-01-21T14:30:00Z",
            "status": "shipped",
            "items": [
                { "id": "inv-002", "name": "Office Chair - Ergonomic Executive", "quantity": 20, "unit_price": 349.99 },
                { "id": "inv-005", "name": "Desk - Standing Adjustable", "quantity": 20, "unit_price": 599.99 }
            ],
            "subtotal": 18999.60,
            "tax": 1519.97,
            "total": 20519.57,
            "created_at": "2024-01-21T14:30:00Z",
            "updated_at": "2024-01-22T10:15:00Z"
        },
        {
            "id": "sale-003",
            "order_number": "SO-2024-003",
            "customer_name": "Creative Design Studio",
            "customer_email": "info@creativedesign.com",
            "order_date": "2024-01-22T09:00:00Z",
            "status": "draft",
            "items": [
                { "id": "inv-004", "name": "Monitor - 27\" 4K UHD", "quantity": 5, "unit_price": 449.99 }
            ],
            "subtotal": 2249.95,
            "tax": 180.00,
            "total": 2429.95,
            "created_at": "2024-01-22T09:00:00Z",
            "updated_at": "2024-01-22T09:00:00Z"
        },
        {
            "id": "sale-004",
            "order_number": "SO-2024-004",
            "customer_name": "Finance Corp",
            "customer_email": "procurement@financecorp.com",
            "order_date": "2024-01-23T11:15:00Z",
            "status": "completed",
            "items": [
                { "id": "inv-001", "name": "Laptop Computer - Dell XPS 15", "quantity": 5, "unit_price": 1299.99 },
                { "id": "inv-004", "name": "Monitor - 27\" 4K UHD", "quantity": 5, "unit_price": 449.99 }
            ],
            "subtotal": 8749.90,
            "tax": 699.99,
            "total": 9449.89,
            "created_at": "2024-01-23T11:15:00Z",
            "updated_at": "2024-01-24T16:00:00Z"
        }
    ]))
}
