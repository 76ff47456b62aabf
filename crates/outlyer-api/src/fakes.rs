//! In-memory fake of the remote service (testing only)
//!
//! `MemoryRemoteService` behaves like the Outlyer API for the calls the sync
//! engine makes: PATCH on an unknown path answers 404, POST to a collection
//! stores the document under its `name`, and every call is recorded so tests
//! can assert on exactly which paths were hit.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;
use crate::service::{ApiResponse, ApiResult, RemoteResourceService};

/// HTTP verb of a recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMethod {
    Get,
    Create,
    Update,
}

/// One call received by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub method: RemoteMethod,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
enum Failure {
    Status(u16, String),
    Transport(String),
}

#[derive(Debug, Deserialize)]
struct NamedDocument {
    name: Option<String>,
}

/// In-memory remote backed by a `HashMap<path, document>`.
#[derive(Debug, Default)]
pub struct MemoryRemoteService {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, Failure>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl MemoryRemoteService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document at `path` (query string included, if any).
    pub fn with_document(self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(path, body);
        self
    }

    /// Answer every call on `path` with `status` and `body`.
    pub fn with_status(self, path: &str, status: u16, body: &str) -> Self {
        self.failures.lock().unwrap().insert(
            path.to_string(),
            Failure::Status(status, body.to_string()),
        );
        self
    }

    /// Fail every call on `path` before a response is received.
    pub fn with_transport_error(self, path: &str, reason: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(path.to_string(), Failure::Transport(reason.to_string()));
        self
    }

    pub fn insert(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
    }

    /// Current document at `path`, if any
    pub fn document(&self, path: &str) -> Option<Vec<u8>> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Paths of the calls made with `method`, sorted
    pub fn paths_for(&self, method: RemoteMethod) -> Vec<String> {
        let mut paths: Vec<String> = self
            .calls()
            .into_iter()
            .filter(|c| c.method == method)
            .map(|c| c.path)
            .collect();
        paths.sort();
        paths
    }

    fn record(&self, method: RemoteMethod, path: &str, body: &[u8]) {
        self.calls.lock().unwrap().push(RemoteCall {
            method,
            path: path.to_string(),
            body: body.to_vec(),
        });
    }

    fn injected(&self, path: &str) -> Option<ApiResult<ApiResponse>> {
        let failures = self.failures.lock().unwrap();
        let failure = failures
            .get(path)
            .or_else(|| failures.get(strip_query(path)))?;
        Some(match failure {
            Failure::Status(status, body) => Ok(ApiResponse::new(*status, body.as_bytes())),
            Failure::Transport(reason) => Err(ApiError::Transport(reason.clone())),
        })
    }
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map(|(p, _)| p).unwrap_or(path)
}

#[async_trait]
impl RemoteResourceService for MemoryRemoteService {
    async fn get(&self, path: &str) -> ApiResult<Vec<u8>> {
        self.record(RemoteMethod::Get, path, &[]);
        if let Some(result) = self.injected(path) {
            return result?.into_result();
        }

        let documents = self.documents.lock().unwrap();
        documents
            .get(path)
            .or_else(|| documents.get(strip_query(path)))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(path.to_string()))
    }

    async fn create(&self, path: &str, body: &[u8]) -> ApiResult<ApiResponse> {
        self.record(RemoteMethod::Create, path, body);
        if let Some(result) = self.injected(path) {
            return result;
        }

        let name = serde_yaml::from_slice::<NamedDocument>(body)
            .ok()
            .and_then(|doc| doc.name)
            .filter(|n| !n.is_empty());
        let Some(name) = name else {
            return Ok(ApiResponse::new(400, "detail: name is required"));
        };

        let document_path = format!("{}/{}", path.trim_end_matches('/'), name);
        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(&document_path) {
            return Ok(ApiResponse::new(409, "detail: resource already exists"));
        }
        documents.insert(document_path, body.to_vec());
        Ok(ApiResponse::new(201, body))
    }

    async fn update(&self, path: &str, body: &[u8]) -> ApiResult<ApiResponse> {
        self.record(RemoteMethod::Update, path, body);
        if let Some(result) = self.injected(path) {
            return result;
        }

        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(path) {
            Some(existing) => {
                *existing = body.to_vec();
                Ok(ApiResponse::new(200, body))
            }
            None => Ok(ApiResponse::new(404, "detail: resource not found")),
        }
    }
}
