//! Error types for outlyer-api

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur talking to the Outlyer API
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400: the resource definition was rejected
    #[error("incorrect resource definition, ensure all fields are correct and try again: {0}")]
    BadRequest(String),

    /// 401 / 403: the token is not allowed to perform the operation
    #[error("you don't have permissions to perform this operation: {0}")]
    Forbidden(String),

    /// 404: the resource does not exist
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other 4xx status
    #[error("client error ({status}): {detail}")]
    Client { status: u16, detail: String },

    /// 5xx: the service could not handle the request
    #[error("Outlyer API is unavailable, try again later: {0}")]
    Unavailable(String),

    /// The request never produced a response
    #[error("could not process request: {0}")]
    Transport(String),

    /// Configuration could not be loaded or is incomplete
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error body returned by the API, e.g. `{status: 404, detail: "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx status code and its response body.
    ///
    /// Returns `None` for 1xx-3xx statuses.
    pub fn from_status(status: u16, body: &[u8]) -> Option<ApiError> {
        if status < 400 {
            return None;
        }

        let detail = error_detail(body);
        let err = match status {
            400 => ApiError::BadRequest(detail),
            401 | 403 => ApiError::Forbidden(detail),
            404 => ApiError::NotFound(detail),
            500..=599 => ApiError::Unavailable(detail),
            _ => ApiError::Client { status, detail },
        };
        Some(err)
    }

    /// Whether this error means the remote resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Prefer the `detail` field of a YAML error body, fall back to the raw text.
fn error_detail(body: &[u8]) -> String {
    if let Ok(ErrorBody {
        detail: Some(detail),
    }) = serde_yaml::from_slice::<ErrorBody>(body)
    {
        return detail;
    }
    String::from_utf8_lossy(body).trim().to_string()
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
