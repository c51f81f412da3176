//! REST client for the ERP backend (`/api/v1/...`).
//!
//! Every call resolves to the decoded JSON body, `None` for `204 No Content`,
//! or an `ApiError` carrying the status, a message and whatever details the
//! backend sent. Network failures use status 0.
//!
//! ## Example
//!
//! ```ignore
//! use erp_store::modules::Module;
//! use erp_store::remote::{ApiClient, RemoteCollection};
//!
//! let client = ApiClient::new("http://localhost:8000/");
//! let inventory = RemoteCollection::for_module(client.clone(), Module::Inventory)?;
//! let page = inventory.list(0, 10, &Default::default()).await?;
//! ```

mod collection;
mod reports;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;

pub use collection::RemoteCollection;
pub use reports::{
    accounting_balance, dashboard_summary, financial_report, inventory_report, sales_report,
};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    /// HTTP status, or 0 when the request never got a response.
    pub status: u16,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    fn invalid_url(url: &str, err: impl std::fmt::Display) -> Self {
        ApiError {
            status: 0,
            message: format!("Invalid API url: {err}"),
            details: json!({ "url": url }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Client for `base_url`; trailing slashes are dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Client for the configured `[api] base_url`, if one is set.
    pub fn from_config(config: &ApiConfig) -> Option<Self> {
        config
            .base_url
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .map(Self::new)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of `path`, with exactly one slash after the base.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };
        Url::parse(&raw).map_err(|e| ApiError::invalid_url(&raw, e))
    }

    /// GET `path`, appending every non-empty entry of `params` as a query
    /// parameter.
    pub async fn get_json(&self, path: &str, params: &Map<String, Value>) -> Result<Option<Value>, ApiError> {
        let mut url = self.url(path)?;
        let pairs = query_pairs(params);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.send(Method::GET, url, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        self.send(Method::POST, self.url(path)?, Some(body)).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        self.send(Method::PUT, self.url(path)?, Some(body)).await
    }

    pub async fn delete_json(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.send(Method::DELETE, self.url(path)?, None).await
    }

    pub async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Option<Value>, ApiError> {
        debug!(%method, %url, "api request");
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%method, %url, error = %err, "api request failed");
            ApiError {
                status: 0,
                message: "Network error while contacting the API".into(),
                details: json!({ "url": url.as_str(), "message": err.to_string() }),
            }
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        let data = if status == StatusCode::NO_CONTENT {
            None
        } else if is_json {
            response.json::<Value>().await.ok()
        } else {
            response.text().await.ok().map(Value::String)
        };

        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "api request rejected");
            return Err(error_from_response(status, &url, data));
        }
        Ok(data)
    }
}

fn error_from_response(status: StatusCode, url: &Url, data: Option<Value>) -> ApiError {
    let message = data
        .as_ref()
        .and_then(|d| d.get("message").or_else(|| d.get("detail")))
        .filter(|m| !m.is_null())
        .map(|m| match m {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    let details = match data {
        Some(data) if !data.is_null() && data != Value::String(String::new()) => data,
        _ => json!({
            "url": url.as_str(),
            "statusText": status.canonical_reason().unwrap_or_default(),
        }),
    };

    ApiError {
        status: status.as_u16(),
        message,
        details,
    }
}

/// Query pairs for `params`, skipping null and empty-string values.
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) if s.is_empty() => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}
