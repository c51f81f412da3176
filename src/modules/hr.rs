//! Employees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::record::{records_from_json, Record};
use crate::validation::{FormRules, Rule};
use crate::EntityView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "hr", rules = "form_rules")]
pub struct Employee {
    #[serde(default)]
    pub id: String,
    pub employee_name: String,
    pub email: String,
    /// Job title, not an access role.
    pub role: String,
    pub department: String,
    #[serde(default = "default_status")]
    pub status: String,
    pub join_date: String,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_status() -> String {
    "active".into()
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

pub fn form_rules() -> FormRules {
    FormRules::new()
        .field("employee_name", [Rule::Required, Rule::MinLength(2), Rule::MaxLength(100)])
        .field("email", [Rule::Required, Rule::Email])
        .field("role", [Rule::Required])
        .field("department", [Rule::Required])
        .field("join_date", [Rule::Required])
        .field("salary", [Rule::NonNegative])
}

/// Headcount per department.
pub fn headcount<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for employee in employees {
        *counts.entry(employee.department.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn seed() -> Vec<Record> {
    records_from_json(json!([
        {
            "id": "emp-001",
            "employee_name": "John Smith",
            "email": "john.smith@erp.local",
            "role": "Software Engineer",
            "department": "Engineering",
            "status": "active",
            "join_date": "2022-03-15T00:00:00Z",
            "salary": 95000,
            "phone": "(555) 123-4567",
            "address": "123 Tech Street, San Francisco, CA 94105",
            "created_at": "2022-03-15T00:00:00Z",
            "updated_at": "2024-01-10T00:00:00Z"
        },
        {
            "id": "emp-002",
            "employee_name": "Sarah Johnson",
            "email": "sarah.johnson@erp.local",
            "role": "Product Manager",
            "department": "Product",
            "status": "active",
            "join_date": "2021-06-01T00:00:00Z",
            "salary": 110000,
            "phone": "(555) 234-5678",
            "address": "456 Market Ave, San Francisco, CA 94102",
            "created_at": "2021-06-01T00:00:00Z",
            "updated_at": "2024-01-10T00:00:00Z"
        },
        {
            "id": "emp-003",
            "employee_name": "Michael Chen",
            "email": "michael.chen@erp.local",
            "role": "UX Designer",
            "department": "Design",
            "status": "active",
            "join_date": "2023-01-10T00:00:00Z",
            "salary": 85000,
            "phone": "(555) 345-6789",
            "address": "789 Design Blvd, San Francisco, CA 94103",
            "created_at": "2023-01-10T00:00:00Z",
            "updated_at": "2024-01-10T00:00:00Z"
        },
        {
            "id": "emp-004",
            "employee_name": "Emily Davis",
            "email": "emily.davis@erp.local",
            "role": "Sales Manager",
            "department": "Sales",
            "status": "active",
            "join_date": "2020-09-20T00:00:00Z",
            "salary": 105000,
            "phone": "(555) 456-7890",
            "address": "321 Commerce St, San Francisco, CA 94104",
            "created_at": "2020-09-20T00:00:00Z",
            "updated_at": "2024-01-10T00:00:00Z"
        },
        {
            "id": "emp-005",
            "employee_name": "David Wilson",
            "email": "david.wilson@erp.local",
            "role": "Accountant",
            "department": "Finance",
            "status": "on_leave",
            "join_date": "2022-11-05T00:00:00Z",
            "salary": 75000,
            "phone": "(555) 567-8901",
            "address": "654 Finance Way, San Francisco, CA 94106",
            "created_at": "2022-11-05T00:00:00Z",
            "updated_at": "2024-01-15T00:00:00Z"
        },
        {
            "id": "emp-006",
            "employee_name": "Lisa Anderson",
            "email": "lisa.anderson@erp.local",
            "role": "HR Specialist",
            "department": "Human Resources",
            "status": "active",
            "join_date": "2021-02-14T00:00:00Z",
            "salary": 70000,
            "phone": "(555) 678-9012",
            "address": "987 HR Plaza, San Francisco, CA 94107",
            "created_at": "2021-02-14T00:00:00Z",
            "updated_at": "2024-01-10T00:00:00Z"
        }
    ]))
}
