pub mod driver;
pub mod monitor;
pub mod rest;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use disco_core::{OperationKind, OperationParams, Reply, Result};
use serde::{Deserialize, Serialize, Serializer};

/// Request/response surface of the DISCO controller.
///
/// Every call returns immediately with a [`Reply`] whose `status` is the
/// transport status (0 = accepted). Snapshot, restore and clone calls only
/// start the work; their `*_detail` counterparts report progress.
#[async_trait]
pub trait DiscoClient: Send + Sync {
    async fn volume_create(&self, name: &str, size_mb: u64) -> Result<Reply>;
    async fn volume_delete(&self, volume_id: &str) -> Result<Reply>;
    async fn volume_extend(&self, volume_id: &str, new_size_mb: u64) -> Result<Reply>;
    async fn volume_clone(&self, src_volume_id: &str, name: &str) -> Result<Reply>;
    async fn volume_detail_by_name(&self, name: &str) -> Result<Reply>;

    async fn snapshot_create(&self, volume_id: &str, description: &str) -> Result<Reply>;
    async fn snapshot_delete(&self, snapshot_id: &str) -> Result<Reply>;
    async fn restore_from_snapshot(&self, snapshot_id: &str, name: &str) -> Result<Reply>;

    async fn snapshot_detail(&self, snapshot_id: i64) -> Result<Reply>;
    async fn restore_detail(&self, restore_id: i64) -> Result<Reply>;
    async fn clone_detail(&self, clone_id: i64, name: &str) -> Result<Reply>;

    async fn system_information_list(&self) -> Result<Reply>;

    /// Issues the status query matching `kind`.
    async fn query_detail(&self, kind: OperationKind, params: &OperationParams) -> Result<Reply> {
        match kind {
            OperationKind::SnapshotDetail => {
                self.snapshot_detail(params.require_i64(kind, "snapshot_id")?)
                    .await
            }
            OperationKind::RestoreDetail => {
                self.restore_detail(params.require_i64(kind, "restore_id")?)
                    .await
            }
            OperationKind::CloneDetail => {
                self.clone_detail(
                    params.require_i64(kind, "clone_id")?,
                    params.require_str(kind, "vol_name")?,
                )
                .await
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub size_gb: u64,
    /// DISCO volume id, set once the backend has created the volume.
    pub provider_location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub display_description: Option<String>,
    pub provider_location: Option<String>,
}

/// Model fields the caller should persist after a driver operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub provider_location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeStats {
    pub volume_backend_name: String,
    pub storage_protocol: String,
    pub driver_version: String,
    pub vendor_name: String,
    pub reserved_percentage: u32,
    #[serde(rename = "QoS_support")]
    pub qos_support: bool,
    pub total_capacity_gb: Capacity,
    pub free_capacity_gb: Capacity,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capacity {
    Known(f64),
    Unknown,
}

impl Serialize for Capacity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Capacity::Known(gb) => serializer.serialize_f64(*gb),
            Capacity::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capacity::Known(gb) => write!(f, "{gb}"),
            Capacity::Unknown => write!(f, "unknown"),
        }
    }
}

pub use driver::{DiscoDriver, size_in_mb};
pub use monitor::{OperationMonitor, monitor_operation};
pub use rest::RestClient;
