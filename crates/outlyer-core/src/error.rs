//! Error taxonomy for the sync engine.
//!
//! Classification, codec, store and remote errors are captured per record
//! as `Outcome::Failed`. Resolve errors and an unwritable output root abort
//! the whole invocation before any task is spawned.

use std::path::PathBuf;

use outlyer_api::ApiError;

/// A path or selector does not name a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("{path}: no resource kind (alerts, checks, dashboards, plugins) in path")]
    NoKindSegment { path: String },

    #[error("{path}: no resource name after '{kind}'")]
    MissingName { path: String, kind: String },

    #[error("invalid resource name: {name:?}")]
    InvalidName { name: String },
}

/// A payload could not be converted between its local and wire form.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed base64 content in plugin {name}: {source}")]
    Base64 {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("document is not a mapping")]
    NotAMapping,

    #[error("document is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("plugin {name} has unsupported encoding '{encoding}'")]
    UnsupportedEncoding { name: String, encoding: String },

    #[error("check document has both '{local}' and '{remote}'")]
    ConflictingFields {
        local: &'static str,
        remote: &'static str,
    },
}

/// Local filesystem failure.
#[derive(Debug, thiserror::Error)]
#[error("{op} {path:?}: {source}")]
pub struct StoreError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StoreError {
    pub fn new(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::NotFound
    }
}

/// User arguments could not be turned into a resource set.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{0}: no such file or directory")]
    NoSuchPath(String),

    #[error("could not find any resources to {0}")]
    NoResources(&'static str),

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("could not determine the home directory to expand '~'")]
    NoHomeDirectory,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("worker task failed: {0}")]
    Task(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_error_display() {
        let err = ClassificationError::NoKindSegment {
            path: "dir1/docker.yaml".to_string(),
        };
        assert!(err.to_string().contains("dir1/docker.yaml"));
        assert!(err.to_string().contains("no resource kind"));
    }

    #[test]
    fn test_resolve_error_display() {
        let err = ResolveError::NoResources("apply");
        assert_eq!(err.to_string(), "could not find any resources to apply");

        let err = ResolveError::NoSuchPath("nope/".to_string());
        assert_eq!(err.to_string(), "nope/: no such file or directory");
    }

    #[test]
    fn test_store_error_not_found() {
        let err = StoreError::new(
            "read",
            "alerts/docker.yaml",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("read \"alerts/docker.yaml\""));
    }

    #[test]
    fn test_sync_error_is_transparent() {
        let err: SyncError = CodecError::MissingField("content").into();
        assert_eq!(err.to_string(), "document is missing required field 'content'");
    }
}
