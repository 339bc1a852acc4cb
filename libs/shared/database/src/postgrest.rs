use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Failure taxonomy shared by every repository implementation. Cells
/// translate these into their own error enums at the service boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Thin HTTP client for a PostgREST-style relational store endpoint.
///
/// The row filters ride in the query string (`?id=eq.<uuid>`); writes that
/// should echo the resulting rows send `Prefer: return=representation`.
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making store request to {}", url);

        let mut headers = self.get_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::NOT_FOUND => StoreError::NotFound,
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                _ => StoreError::Backend(format!("{}: {}", status, error_text)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("failed to decode store response: {}", e)))
    }

    /// POST a row and return the created representation.
    pub async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::POST, &format!("/rest/v1/{}", table), Some(row), Some(headers))
            .await
    }

    /// PATCH the rows matching `filter`, returning the updated
    /// representations. An empty result means the filter matched nothing —
    /// callers using a version filter treat that as a lost compare-and-swap.
    pub async fn patch_guarded(
        &self,
        table: &str,
        filter: &str,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(
            Method::PATCH,
            &format!("/rest/v1/{}?{}", table, filter),
            Some(patch),
            Some(headers),
        )
        .await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
