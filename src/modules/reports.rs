//! Saved report definitions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::Module;
use crate::record::{records_from_json, Record};
use crate::validation::{FormRules, Rule};
use crate::EntityView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "reports", rules = "form_rules")]
pub struct ReportDefinition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Module the report draws from.
    pub module: Module,
    pub report_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Cron expression; `None` for on-demand reports.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_status() -> String {
    "draft".into()
}

impl ReportDefinition {
    pub fn is_scheduled(&self) -> bool {
        self.schedule.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

pub fn form_rules() -> FormRules {
    FormRules::new()
        .field("name", [Rule::Required, Rule::MaxLength(120)])
        .field("module", [Rule::Required])
        .field("report_type", [Rule::Required])
}

pub fn seed() -> Vec<Record> {
    records_from_json(json!([
        {
            "id": "rep-001",
            "name": "Monthly Sales Report",
            "module": "sales",
            "report_type": "summary",
            "parameters": { "date_range": "current_month", "groupBy": "customer" },
            "schedule": null,
            "created_at": "2024-01-01T00:00:00Z",
            "last_run": "2024-01-24T10:00:00Z",
            "status": "completed"
        },
        {
            "id": "rep-002",
            "name": "Inventory Status Report",
            "module": "inventory",
            "report_type": "detail",
            "parameters": { "includeOutOfStock": true, "includeLowStock": true },
            "schedule": "0 9 * * 1",
            "created_at": "2024-01-01T00:00:00Z",
            "last_run": "2024-01-22T09:00:00Z",
            "status": "completed"
        },
        {
            "id": "rep-003",
            "name": "Financial Summary",
            "module": "accounting",
            "report_type": "analytics",
            "parameters": { "date_range": "current_quarter", "includeCharts": true },
            "schedule": null,
            "created_at": "2024-01-01T00:00:00Z",
            "last_run": "2024-01-23T14:30:00Z",
            "status": "completed"
        },
        {
            "id": "rep-004",
            "name": "Purchase Orders Report",
            "module": "purchases",
            "report_type": "detail",
            "parameters": { "date_range": "last_30_days", "status": "all" },
            "schedule": null,
            "created_at": "2024-01-05T00:00:00Z",
            "last_run": "2024-01-24T11:00:00Z",
            "status": "completed"
        },
        {
            "id": "rep-005",
            "name": "Employee Directory",
            "module": "hr",
            "report_type": "summary",
            "parameters": { "includeSalary": false, "groupBy": "department" },
            "schedule": null,
            "created_at": "2024-01-01T00:00:00Z",
            "last_run": "2024-01-20T08:00:00Z",
            "status": "completed"
        }
    ]))
}
