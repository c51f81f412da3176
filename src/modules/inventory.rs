//! Inventory items.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::query::search_filter;
use crate::record::{records_from_json, Record};
use crate::validation::{FormRules, Rule};
use crate::EntityView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "inventory", rules = "form_rules")]
pub struct InventoryItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub quantity: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default = "default_reorder_level")]
    pub reorder_level: i64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_reorder_level() -> i64 {
    10
}

fn default_status() -> String {
    "active".into()
}

impl InventoryItem {
    /// A blank item as a new-item form starts out.
    pub fn new(name: impl Into<String>, sku: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            sku: sku.into(),
            quantity: 0,
            category: category.into(),
            supplier_id: None,
            supplier_name: None,
            unit_price: 0.0,
            reorder_level: default_reorder_level(),
            status: default_status(),
            created_at: None,
            updated_at: None,
        }
    }

    /// At or below the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn stock_value(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

pub fn form_rules() -> FormRules {
    FormRules::new()
        .field("name", [Rule::Required])
        .field("sku", [Rule::Required])
        .field("quantity", [Rule::Required, Rule::NonNegative])
        .field("category", [Rule::Required])
        .field("unit_price", [Rule::Required, Rule::Positive])
        .field("reorder_level", [Rule::NonNegative])
}

/// Search box filter: name, SKU or category contains `term`.
pub fn search(term: &str) -> impl Fn(&Record) -> bool + Send + Sync + 'static {
    search_filter(term, &["name", "sku", "category"])
}

/// Records whose quantity is at or below their reorder level.
pub fn low_stock(record: &Record) -> bool {
    let number = |field: &str| record.get(field).and_then(|v| v.as_f64());
    matches!((number("quantity"), number("reorder_level")), (Some(q), Some(r)) if q <= r)
}

pub fn seed() -> Vec<Record> {
    records_from_json(json!([
        {
            "id": "inv-001",
            "name": "Laptop Computer - Dell XPS 15",
            "sku": "LAP-XPS15-001",
            "quantity": 45,
            "category": "Electronics",
            "supplier_id": "sup-001",
            "supplier_name": "Dell Technologies",
            "unit_price": 1299.99,
            "reorder_level": 10,
            "status": "active",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-20T14:30:00Z"
        },
        {
            "id": "inv-002",
            "name": "Office Chair - Ergonomic Executive",
            "sku": "FUR-CHAIR-002",
            "quantity": 8,
            "category": "Furniture",
            "supplier_id": "sup-002",
            "supplier_name": "Office Supplies Inc",
            "unit_price": 349.99,
            "reorder_level": 15,
            "status": "low_stock",
            "created_at": "2024-01-10T09:00:00Z",
            "updated_at": "2024-01-22T11:15:00Z"
        },
        {
            "id": "inv-003",
            "name": "Wireless Mouse - Logitech MX Master 3",
            "sku": "ACC-MOUSE-003",
            "quantity": 120,
            "category": "Accessories",
            "supplier_id": "sup-003",
            "supplier_name": "Logitech",
            "unit_price": 99.99,
            "reorder_level": 25,
            "status": "active",
            "created_at": "2024-01-12T08:30:00Z",
            "updated_at": "2024-01-18T16:45:00Z"
        },
        {
            "id": "inv-004",
            "name": "Monitor - 27\" 4K UHD",
            "sku": "MON-4K27-004",
            "quantity": 32,
            "category": "Electronics",
            "supplier_id": "sup-004",
            "supplier_name": "Samsung Electronics",
            "unit_price": 449.99,
            "reorder_level": 10,
            "status": "active",
            "created_at": "2024-01-14T13:00:00Z",
            "updated_at": "2024-01-21T10:00:00Z"
        },
        {
            "id": "inv-005",
            "name": "Desk - Standing Adjustable",
            "sku": "FUR-DESK-005",
            "quantity": 5,
            "category": "Furniture",
            "supplier_id": "sup-002",
            "supplier_name": "Office Supplies Inc",
            "unit_price": 599.99,
            "reorder_level": 8,
            "status": "low_stock",
            "created_at": "2024-01-16T11:30:00Z",
            "updated_at": "2024-01-23T09:20:00Z"
        }
    ]))
}
