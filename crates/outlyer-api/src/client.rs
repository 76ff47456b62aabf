//! Outlyer HTTP API client
//!
//! Production `RemoteResourceService` backed by reqwest. Every request
//! carries the bearer token and YAML content negotiation headers.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::service::{ApiResponse, ApiResult, RemoteResourceService};

const YAML_MEDIA_TYPE: &str = "application/yaml";

/// The authenticated user, as returned by `GET /user`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub default_account: String,
}

/// HTTP client for the Outlyer API
pub struct HttpApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl HttpApiClient {
    /// Create a new client
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpApiClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.url_for(path);
        debug!("{} {}", method, url);
        self.http_client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_token))
            .header(ACCEPT, YAML_MEDIA_TYPE)
            .header(CONTENT_TYPE, YAML_MEDIA_TYPE)
    }

    async fn send(&self, method: Method, path: &str, body: &[u8]) -> ApiResult<ApiResponse> {
        let response = self
            .request(method, path)
            .body(body.to_vec())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        if status >= 400 {
            warn!("{} answered {}", path, status);
        }
        Ok(ApiResponse::new(status, body))
    }

    /// Fetch the authenticated user. Used to validate a token.
    pub async fn user(&self) -> ApiResult<UserInfo> {
        let body = self.get("/user").await?;
        Ok(serde_yaml::from_slice(&body)?)
    }

    /// Raw listing of the accounts visible to the token
    pub async fn accounts(&self) -> ApiResult<Vec<u8>> {
        self.get("/accounts").await
    }
}

#[async_trait]
impl RemoteResourceService for HttpApiClient {
    async fn get(&self, path: &str) -> ApiResult<Vec<u8>> {
        let response = self.request(Method::GET, path).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        ApiResponse::new(status, body).into_result()
    }

    async fn create(&self, path: &str, body: &[u8]) -> ApiResult<ApiResponse> {
        self.send(Method::POST, path, body).await
    }

    async fn update(&self, path: &str, body: &[u8]) -> ApiResult<ApiResponse> {
        self.send(Method::PATCH, path, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_keeps_config() {
        let config = ApiConfig::new("https://api.example.com/v2").with_token("secret");
        let client = HttpApiClient::new(config.clone()).unwrap();
        assert_eq!(client.config(), &config);
    }

    #[test]
    fn test_user_info_parses_default_account() {
        let user: UserInfo =
            serde_yaml::from_str("name: Jane\ndefault_account: acme\n").unwrap();
        assert_eq!(user.default_account, "acme");

        let user: UserInfo = serde_yaml::from_str("name: Jane\n").unwrap();
        assert!(user.default_account.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = ApiConfig::new("http://127.0.0.1:1").with_timeout_secs(2);
        let client = HttpApiClient::new(config).unwrap();

        let err = client.get("/accounts").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
