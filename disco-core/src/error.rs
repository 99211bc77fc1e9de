use crate::types::OperationKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoError {
    #[error("Unsupported operation kind: {0}")]
    UnsupportedOperationKind(String),

    #[error("Error while getting {kind} details, returned code: {status}")]
    OperationQueryFailed { kind: OperationKind, status: i64 },

    #[error("Invalid reply for {operation}: {reason}")]
    InvalidReply { operation: String, reason: String },

    #[error("Operation {kind} failed on the backend: {payload}")]
    OperationFailed {
        kind: OperationKind,
        payload: serde_json::Value,
    },

    #[error("Timeout while calling {kind} after {elapsed:?} (limit {timeout:?})")]
    OperationTimedOut {
        kind: OperationKind,
        elapsed: Duration,
        timeout: Duration,
    },

    #[error("Monitoring of {kind} cancelled after {elapsed:?}")]
    Cancelled { kind: OperationKind, elapsed: Duration },

    #[error("Missing parameter '{name}' for {kind}")]
    MissingParameter { kind: OperationKind, name: String },

    #[error("Error while calling {operation} [status] {status} - [result] {result}")]
    BackendApi {
        operation: String,
        status: i64,
        result: String,
    },

    #[error("Backend operation {operation} failed: {source}")]
    BackendOperation {
        operation: String,
        #[source]
        source: Box<DiscoError>,
    },

    #[error("Network error during {operation}: {cause}")]
    NetworkError { operation: String, cause: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl DiscoError {
    /// Wraps a failure under the name of the driver operation that hit it.
    pub fn backend_operation(operation: impl Into<String>, source: DiscoError) -> Self {
        DiscoError::BackendOperation {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `BackendOperation` wrappers.
    pub fn root(&self) -> &DiscoError {
        match self {
            DiscoError::BackendOperation { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoError>;
