//! Remote resource service abstraction
//!
//! `RemoteResourceService` is the narrow capability the sync engine needs
//! from the Outlyer API: fetch a document, create one, update one. It is
//! async and transport-agnostic; `HttpApiClient` is the production
//! implementation and `fakes::MemoryRemoteService` backs the tests.

use async_trait::async_trait;

use crate::error::ApiError;

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Status code and body of a mutating call.
///
/// Mutations hand the status back to the caller instead of failing, so the
/// caller can decide what a 404 means (e.g. fall back to a create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `true` when the remote reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Classified error for a non-2xx response, `None` on success.
    pub fn error(&self) -> Option<ApiError> {
        ApiError::from_status(self.status, &self.body)
    }

    /// Turn a non-2xx response into an error, keeping the body otherwise.
    pub fn into_result(self) -> ApiResult<Vec<u8>> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self.body),
        }
    }
}

/// Remote resource service.
///
/// Paths are relative to the API base URL and start with `/`, e.g.
/// `/accounts/acme/alerts/docker`. They may carry a query string.
///
/// Guarantees:
/// - `get` fails with a classified `ApiError` for any non-2xx status.
/// - `create` and `update` only fail when no response was received; the
///   status of a received response is always returned as-is.
#[async_trait]
pub trait RemoteResourceService: Send + Sync {
    /// GET a document.
    async fn get(&self, path: &str) -> ApiResult<Vec<u8>>;

    /// POST a new document to a collection path.
    async fn create(&self, path: &str, body: &[u8]) -> ApiResult<ApiResponse>;

    /// PATCH an existing document.
    async fn update(&self, path: &str, body: &[u8]) -> ApiResult<ApiResponse>;
}
