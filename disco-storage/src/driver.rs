use crate::monitor::OperationMonitor;
use crate::{Capacity, DiscoClient, ModelUpdate, Snapshot, Volume, VolumeStats};
use chrono::Utc;
use disco_core::{Config, DiscoError, OperationKind, OperationParams, Reply, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const DRIVER_VERSION: &str = "1.1";
pub const STORAGE_PROTOCOL: &str = "disco";
pub const VENDOR_NAME: &str = "ITRI";

/// Volume driver for DISCO block storage.
///
/// Snapshot, restore and clone requests are acknowledged immediately by
/// DISCO; the driver blocks on the [`OperationMonitor`] until each one
/// finishes before reporting back.
pub struct DiscoDriver {
    client: Arc<dyn DiscoClient>,
    config: Config,
    monitor: OperationMonitor,
    stats: RwLock<Option<VolumeStats>>,
}

impl DiscoDriver {
    pub fn new(client: Arc<dyn DiscoClient>, config: Config) -> Self {
        let monitor = OperationMonitor::new(client.clone(), config.monitor.poll_interval());
        Self {
            client,
            config,
            monitor,
            stats: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn monitor(&self) -> &OperationMonitor {
        &self.monitor
    }

    pub fn check_for_setup_error(&self) -> Result<()> {
        self.config.validate()
    }

    pub async fn create_volume(&self, volume: &Volume) -> Result<ModelUpdate> {
        let name = self.backend_name(volume);
        let size_mb = size_in_mb(volume.size_gb)?;
        debug!("Create volume : [name] {} - [size] {}", name, size_mb);

        let reply = self.client.volume_create(&name, size_mb).await?;
        let reply = check_reply("volume_create", reply)?;

        info!("Volume {} created", volume.name);
        Ok(ModelUpdate {
            provider_location: reply.result_text(),
        })
    }

    pub async fn delete_volume(&self, volume: &Volume) -> Result<()> {
        let disco_vol_id = provider_location(&volume.provider_location, "volume", &volume.id)?;
        debug!("Delete disco volume : {}", disco_vol_id);

        let reply = self.client.volume_delete(disco_vol_id).await?;
        check_reply("volume_delete", reply)?;

        info!("Volume {} deleted", volume.name);
        Ok(())
    }

    pub async fn create_snapshot(&self, snapshot: &Snapshot, volume: &Volume) -> Result<ModelUpdate> {
        let vol_id = provider_location(&volume.provider_location, "volume", &volume.id)?;
        let description = snapshot.display_description.as_deref().unwrap_or_default();
        debug!(
            "Create snapshot of volume : {}, description : {}",
            vol_id, description
        );

        let reply = self.client.snapshot_create(vol_id, description).await?;
        let reply = check_reply("snapshot_create", reply)?;
        let snapshot_id = pending_id("snapshot_create", &reply)?;

        let kind = OperationKind::SnapshotDetail;
        self.monitor
            .monitor(
                kind,
                &OperationParams::snapshot(snapshot_id),
                self.config.monitor.timeout_for(kind),
            )
            .await
            .map_err(|e| DiscoError::backend_operation("create_snapshot", e))?;

        info!("Snapshot taken successfully on volume {}", volume.name);
        Ok(ModelUpdate {
            provider_location: reply.result_text(),
        })
    }

    pub async fn delete_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let snap_id = provider_location(&snapshot.provider_location, "snapshot", &snapshot.id)?;
        debug!("Delete snapshot : {}", snap_id);

        let reply = self.client.snapshot_delete(snap_id).await?;
        check_reply("snapshot_delete", reply)?;
        Ok(())
    }

    pub async fn create_volume_from_snapshot(
        &self,
        volume: &Volume,
        snapshot: &Snapshot,
    ) -> Result<ModelUpdate> {
        let snap_id = provider_location(&snapshot.provider_location, "snapshot", &snapshot.id)?;
        let name = self.backend_name(volume);
        debug!(
            "Create volume from snapshot : {} - name : {}",
            snap_id, name
        );

        let reply = self.client.restore_from_snapshot(snap_id, &name).await?;
        let reply = check_reply("restore_from_snapshot", reply)?;
        let restore_id = pending_id("restore_from_snapshot", &reply)?;

        let kind = OperationKind::RestoreDetail;
        self.monitor
            .monitor(
                kind,
                &OperationParams::restore(restore_id),
                self.config.monitor.timeout_for(kind),
            )
            .await
            .map_err(|e| DiscoError::backend_operation("create_volume_from_snapshot", e))?;

        let new_vol_id = self.volume_id_by_name(&name).await?;
        info!("Restore done, [volume id] {}", new_vol_id);
        Ok(ModelUpdate {
            provider_location: new_vol_id,
        })
    }

    pub async fn create_cloned_volume(&self, volume: &Volume, source: &Volume) -> Result<ModelUpdate> {
        let src_vol_id = provider_location(&source.provider_location, "volume", &source.id)?;
        let name = self.backend_name(volume);
        debug!(
            "Clone volume : [name] {} - [source] {} - [size] {}GB",
            name, src_vol_id, volume.size_gb
        );

        let reply = self.client.volume_clone(src_vol_id, &name).await?;
        let reply = check_reply("volume_clone", reply)?;
        let clone_id = pending_id("volume_clone", &reply)?;

        let kind = OperationKind::CloneDetail;
        self.monitor
            .monitor(
                kind,
                &OperationParams::clone_of(clone_id, name.as_str()),
                self.config.monitor.timeout_for(kind),
            )
            .await
            .map_err(|e| DiscoError::backend_operation("create_cloned_volume", e))?;

        let new_vol_id = self.volume_id_by_name(&name).await?;
        info!("Clone done, [volume id] {}", new_vol_id);
        Ok(ModelUpdate {
            provider_location: new_vol_id,
        })
    }

    pub async fn extend_volume(&self, volume: &Volume, new_size_gb: u64) -> Result<()> {
        let vol_id = provider_location(&volume.provider_location, "volume", &volume.id)?;
        debug!("Extend volume : {}, new size : {}", vol_id, new_size_gb);

        let size_mb = size_in_mb(new_size_gb)?;
        let reply = self.client.volume_extend(vol_id, size_mb).await?;
        check_reply("volume_extend", reply)?;

        info!("Volume {} extended to {}GB", vol_id, new_size_gb);
        Ok(())
    }

    pub async fn get_volume_stats(&self, refresh: bool) -> VolumeStats {
        if !refresh {
            if let Some(stats) = self.stats.read().await.as_ref() {
                return stats.clone();
            }
        }
        self.update_volume_stats().await
    }

    /// Refreshes the cached backend stats. Capacity falls back to `unknown`
    /// when DISCO cannot be queried.
    pub async fn update_volume_stats(&self) -> VolumeStats {
        let (total_capacity_gb, free_capacity_gb) = match self.fetch_capacity().await {
            Ok(capacity) => capacity,
            Err(e) => {
                warn!("Could not read DISCO capacity: {}", e);
                (Capacity::Unknown, Capacity::Unknown)
            }
        };

        let stats = VolumeStats {
            volume_backend_name: self
                .config
                .backend_name
                .clone()
                .unwrap_or_else(|| "disco".to_string()),
            storage_protocol: STORAGE_PROTOCOL.to_string(),
            driver_version: DRIVER_VERSION.to_string(),
            vendor_name: VENDOR_NAME.to_string(),
            reserved_percentage: 0,
            qos_support: false,
            total_capacity_gb,
            free_capacity_gb,
            updated_at: Utc::now(),
        };

        *self.stats.write().await = Some(stats.clone());
        stats
    }

    pub fn local_path(&self, volume: &Volume) -> PathBuf {
        PathBuf::from(format!("/dev/dms{}", volume.name))
    }

    fn backend_name(&self, volume: &Volume) -> String {
        format!("{}{}", self.config.volumes.name_prefix, volume.id)
    }

    async fn volume_id_by_name(&self, name: &str) -> Result<String> {
        let reply = self.client.volume_detail_by_name(name).await?;
        let reply = check_reply("volume_detail_by_name", reply)?;

        let id = reply
            .get("volumeInfoResult")
            .and_then(|info| info.get("volumeId"))
            .ok_or_else(|| DiscoError::InvalidReply {
                operation: "volume_detail_by_name".to_string(),
                reason: format!("no volumeInfoResult.volumeId for {name}"),
            })?;

        Ok(match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    async fn fetch_capacity(&self) -> Result<(Capacity, Capacity)> {
        let reply = self.client.system_information_list().await?;
        let reply = check_reply("system_information_list", reply)?;

        let infos = reply
            .get("propertyListResult")
            .and_then(|list| list.get("PropertyInfoList"))
            .and_then(|list| list.as_array())
            .ok_or_else(|| DiscoError::InvalidReply {
                operation: "system_information_list".to_string(),
                reason: "missing propertyListResult.PropertyInfoList".to_string(),
            })?;

        let mut total = Capacity::Unknown;
        let mut free = Capacity::Unknown;
        for info in infos {
            let value = info.get("value").and_then(parse_gb);
            match (info.get("name").and_then(|n| n.as_str()), value) {
                (Some("totalCapacityGB"), Some(gb)) => total = Capacity::Known(gb),
                (Some("freeCapacityGB"), Some(gb)) => free = Capacity::Known(gb),
                _ => {}
            }
        }

        Ok((total, free))
    }
}

/// Converts a size in GB to the MB figure DISCO expects.
pub fn size_in_mb(size_gb: u64) -> Result<u64> {
    size_gb
        .checked_mul(1024)
        .ok_or_else(|| DiscoError::ConfigError(format!("Volume size {size_gb}GB is too large")))
}

/// Fails with `BackendApi` when DISCO rejected a synchronous request.
fn check_reply(operation: &str, reply: Reply) -> Result<Reply> {
    if reply.is_accepted() {
        return Ok(reply);
    }

    let result = reply.result_text();
    error!(
        "Error while calling {} [status] {} - [result] {}",
        operation, reply.status, result
    );
    Err(DiscoError::BackendApi {
        operation: operation.to_string(),
        status: reply.status,
        result,
    })
}

fn pending_id(operation: &str, reply: &Reply) -> Result<i64> {
    reply.result_i64().ok_or_else(|| DiscoError::InvalidReply {
        operation: operation.to_string(),
        reason: format!("result is not an operation id: {}", reply.result_text()),
    })
}

fn provider_location<'a>(location: &'a Option<String>, what: &str, id: &str) -> Result<&'a str> {
    location
        .as_deref()
        .ok_or_else(|| DiscoError::StorageError(format!("{what} {id} has no provider location")))
}

fn parse_gb(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
