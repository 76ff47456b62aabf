//! Outlyer-API: transport layer for the Outlyer CLI
//!
//! This crate owns everything that talks to the Outlyer REST API or to the
//! user's persisted settings. The sync engine only sees the
//! `RemoteResourceService` trait.
//!
//! ## Key Components
//!
//! - `RemoteResourceService`: get/create/update capability used by apply and export
//! - `HttpApiClient`: reqwest implementation with bearer auth and YAML headers
//! - `ApiConfig` / `CliConfig`: explicit client settings and the `~/.outlyer.yaml` file
//! - `fakes::MemoryRemoteService`: in-memory implementation for tests

mod client;
mod config;
mod error;
pub mod fakes;
pub mod service;

pub use client::{HttpApiClient, UserInfo};
pub use config::{
    ApiConfig, CliConfig, CONFIG_FILE_NAME, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
pub use error::ApiError;
pub use service::{ApiResponse, ApiResult, RemoteResourceService};

/// Result type for outlyer-api operations
pub type Result<T> = std::result::Result<T, ApiError>;
