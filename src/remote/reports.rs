//! Report and balance endpoints.

use serde_json::{Map, Value};

use super::{ApiClient, ApiError};

async fn fetch(client: &ApiClient, path: &str) -> Result<Value, ApiError> {
    Ok(client.get_json(path, &Map::new()).await?.unwrap_or(Value::Null))
}

pub async fn dashboard_summary(client: &ApiClient) -> Result<Value, ApiError> {
    fetch(client, "/api/v1/reports/summary").await
}

pub async fn sales_report(client: &ApiClient) -> Result<Value, ApiError> {
    fetch(client, "/api/v1/reports/sales").await
}

pub async fn inventory_report(client: &ApiClient) -> Result<Value, ApiError> {
    fetch(client, "/api/v1/reports/inventory").await
}

pub async fn financial_report(client: &ApiClient) -> Result<Value, ApiError> {
    fetch(client, "/api/v1/reports/financial").await
}

pub async fn accounting_balance(client: &ApiClient) -> Result<Value, ApiError> {
    fetch(client, "/api/v1/accounting/balance").await
}
