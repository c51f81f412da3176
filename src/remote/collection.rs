use reqwest::Method;
use serde_json::{Map, Value};

use super::{ApiClient, ApiError};
use crate::modules::Module;

/// CRUD over one REST collection, e.g. `/api/v1/inventory/`.
#[derive(Debug, Clone)]
pub struct RemoteCollection {
    client: ApiClient,
    path: String,
}

impl RemoteCollection {
    /// `path` is the collection path used for list and create; item paths
    /// append the percent-encoded id to it.
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    /// The backend resource of `module`. Fails for modules without one.
    pub fn for_module(client: ApiClient, module: Module) -> Result<Self, ApiError> {
        let path = module.api_path().ok_or_else(|| ApiError {
            status: 0,
            message: format!("{module} has no REST collection"),
            details: Value::Null,
        })?;
        Ok(Self::new(client, path))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// One page starting at `skip`, narrowed by `filters` (empty values are
    /// not sent).
    pub async fn list(&self, skip: usize, limit: usize, filters: &Map<String, Value>) -> Result<Value, ApiError> {
        let mut params = Map::new();
        params.insert("skip".into(), skip.into());
        params.insert("limit".into(), limit.into());
        params.extend(filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(self.client.get_json(&self.path, &params).await?.unwrap_or(Value::Null))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Value>, ApiError> {
        let url = self.item_url(id)?;
        self.client.send(Method::GET, url, None).await
    }

    pub async fn create(&self, payload: &Value) -> Result<Option<Value>, ApiError> {
        self.client.post_json(&self.path, payload).await
    }

    pub async fn update(&self, id: &str, payload: &Value) -> Result<Option<Value>, ApiError> {
        let url = self.item_url(id)?;
        self.client.send(Method::PUT, url, Some(payload)).await
    }

    pub async fn delete(&self, id: &str) -> Result<Option<Value>, ApiError> {
        let url = self.item_url(id)?;
        self.client.send(Method::DELETE, url, None).await
    }

    fn item_url(&self, id: &str) -> Result<reqwest::Url, ApiError> {
        let mut url = self.client.url(&self.path)?;
        let base = url.to_string();
        url.path_segments_mut()
            .map_err(|_| ApiError::invalid_url(&base, "url cannot be a base"))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}
