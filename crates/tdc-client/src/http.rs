//! # API Client
//!
//! Thin reqwest wrapper shared by the query and insights clients. Every call
//! carries the bearer key when one is configured; any non-2xx status becomes
//! [`ClientError::Server`] with the `message` field of the body if present.
//! No timeouts are applied.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::ClientError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let mut request = self.http.get(self.url(path));
        if !params.is_empty() {
            request = request.query(params);
        }
        self.send(request).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: server_message(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

/// `{"message": "..."}` from an error body, if the body has one.
fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = ApiClient::new("http://localhost:3001/api/", None);
        assert_eq!(api.base_url(), "http://localhost:3001/api");
        assert_eq!(api.url("/query/execute"), "http://localhost:3001/api/query/execute");
    }

    #[test]
    fn test_server_message() {
        assert_eq!(
            server_message(br#"{"message": "Collection not found"}"#).as_deref(),
            Some("Collection not found")
        );
        assert_eq!(server_message(br#"{"message": ""}"#), None);
        assert_eq!(server_message(br#"{"error": "x"}"#), None);
        assert_eq!(server_message(b"<html>Bad Gateway</html>"), None);
    }
}
