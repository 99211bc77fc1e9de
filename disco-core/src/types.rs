use crate::{DiscoError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Long-running backend operations whose completion is tracked by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SnapshotDetail,
    RestoreDetail,
    CloneDetail,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::SnapshotDetail,
        OperationKind::RestoreDetail,
        OperationKind::CloneDetail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::SnapshotDetail => "snapshot_detail",
            OperationKind::RestoreDetail => "restore_detail",
            OperationKind::CloneDetail => "clone_detail",
        }
    }

    /// Parameter names a status query for this kind needs.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            OperationKind::SnapshotDetail => &["snapshot_id"],
            OperationKind::RestoreDetail => &["restore_id"],
            OperationKind::CloneDetail => &["clone_id", "vol_name"],
        }
    }

    /// Where the progress status lives in a detail reply for this kind.
    pub fn status_field(&self) -> StatusField {
        match self {
            OperationKind::SnapshotDetail => StatusField::Nested("snapshotInfoResult"),
            OperationKind::RestoreDetail => StatusField::Nested("restoreInfoResult"),
            OperationKind::CloneDetail => StatusField::TopLevelResult,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = DiscoError;

    fn from_str(s: &str) -> Result<Self> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DiscoError::UnsupportedOperationKind(s.to_string()))
    }
}

/// Location of the status code inside a detail reply.
///
/// Snapshot and restore replies nest it under an info-result object, while
/// clone replies reuse the top-level `result` field as the status itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    Nested(&'static str),
    TopLevelResult,
}

impl StatusField {
    pub fn extract(&self, reply: &Reply) -> Option<i64> {
        let value = match self {
            StatusField::Nested(field) => reply.get(field)?.get("status")?,
            StatusField::TopLevelResult => reply.result()?,
        };
        as_integer(value)
    }
}

/// Progress status reported by DISCO for a pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Success,
    Ongoing,
    Failure,
}

impl StatusCode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(StatusCode::Success),
            2 => Some(StatusCode::Ongoing),
            3 => Some(StatusCode::Failure),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            StatusCode::Success => 1,
            StatusCode::Ongoing => 2,
            StatusCode::Failure => 3,
        }
    }
}

/// Identifying parameters of a pending operation, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationParams(BTreeMap<String, Value>);

impl OperationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(snapshot_id: i64) -> Self {
        Self::new().with("snapshot_id", snapshot_id)
    }

    pub fn restore(restore_id: i64) -> Self {
        Self::new().with("restore_id", restore_id)
    }

    pub fn clone_of(clone_id: i64, vol_name: impl Into<String>) -> Self {
        Self::new()
            .with("clone_id", clone_id)
            .with("vol_name", vol_name.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn require_i64(&self, kind: OperationKind, name: &str) -> Result<i64> {
        self.get(name)
            .and_then(as_integer)
            .ok_or_else(|| DiscoError::MissingParameter {
                kind,
                name: name.to_string(),
            })
    }

    pub fn require_str(&self, kind: OperationKind, name: &str) -> Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| DiscoError::MissingParameter {
                kind,
                name: name.to_string(),
            })
    }
}

/// A DISCO API reply: the transport `status` plus whatever the call returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub status: i64,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Reply {
    pub fn new(status: i64) -> Self {
        Self {
            status,
            payload: Map::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(field.into(), value.into());
        self
    }

    pub fn is_accepted(&self) -> bool {
        self.status == 0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn result(&self) -> Option<&Value> {
        self.get("result")
    }

    pub fn result_i64(&self) -> Option<i64> {
        self.result().and_then(as_integer)
    }

    /// The `result` field rendered as text, the way DISCO ids are stored.
    pub fn result_text(&self) -> String {
        match self.result() {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn payload_value(&self) -> Value {
        Value::Object(self.payload.clone())
    }
}

/// Accepts both JSON integers and numeric strings; DISCO emits either.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
