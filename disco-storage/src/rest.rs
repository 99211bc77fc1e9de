use crate::DiscoClient;
use async_trait::async_trait;
use disco_core::{Config, DiscoError, Reply, Result};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// JSON-over-HTTP client for the DISCO REST API.
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DiscoError::NetworkError {
                operation: "build_client".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, operation: &str, path: &str, body: Value) -> Result<Reply> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} ({}): {}", url, operation, body);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DiscoError::NetworkError {
                operation: operation.to_string(),
                cause: format!("HTTP request to {url} failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DiscoError::NetworkError {
                operation: operation.to_string(),
                cause: format!("HTTP {status}: {error_text}"),
            });
        }

        let text = response.text().await.map_err(|e| DiscoError::NetworkError {
            operation: operation.to_string(),
            cause: format!("Failed to read response body: {e}"),
        })?;

        if text.trim().is_empty() {
            return Err(DiscoError::InvalidReply {
                operation: operation.to_string(),
                reason: "empty response body".to_string(),
            });
        }

        let reply: Reply = serde_json::from_str(&text).map_err(|e| DiscoError::InvalidReply {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;
        debug!("{} reply: {:?}", operation, reply);

        Ok(reply)
    }
}

#[async_trait]
impl DiscoClient for RestClient {
    async fn volume_create(&self, name: &str, size_mb: u64) -> Result<Reply> {
        self.call(
            "volume_create",
            "/volume/create",
            json!({"volumeName": name, "volumeSize": size_mb}),
        )
        .await
    }

    async fn volume_delete(&self, volume_id: &str) -> Result<Reply> {
        self.call(
            "volume_delete",
            "/volume/delete",
            json!({"volumeId": volume_id}),
        )
        .await
    }

    async fn volume_extend(&self, volume_id: &str, new_size_mb: u64) -> Result<Reply> {
        self.call(
            "volume_extend",
            "/volume/extend",
            json!({"volumeId": volume_id, "volumeSize": new_size_mb}),
        )
        .await
    }

    async fn volume_clone(&self, src_volume_id: &str, name: &str) -> Result<Reply> {
        self.call(
            "volume_clone",
            "/volume/clone",
            json!({"srcVolumeId": src_volume_id, "volumeName": name}),
        )
        .await
    }

    async fn volume_detail_by_name(&self, name: &str) -> Result<Reply> {
        self.call(
            "volume_detail_by_name",
            "/volume/detail-by-name",
            json!({"volumeName": name}),
        )
        .await
    }

    async fn snapshot_create(&self, volume_id: &str, description: &str) -> Result<Reply> {
        // -1 start/end times ask DISCO for an immediate local snapshot.
        self.call(
            "snapshot_create",
            "/snapshot/create",
            json!({
                "volumeId": volume_id,
                "startTime": -1,
                "endTime": -1,
                "description": description,
            }),
        )
        .await
    }

    async fn snapshot_delete(&self, snapshot_id: &str) -> Result<Reply> {
        self.call(
            "snapshot_delete",
            "/snapshot/delete",
            json!({"snapshotId": snapshot_id}),
        )
        .await
    }

    async fn restore_from_snapshot(&self, snapshot_id: &str, name: &str) -> Result<Reply> {
        self.call(
            "restore_from_snapshot",
            "/snapshot/restore",
            json!({"snapshotId": snapshot_id, "volumeName": name}),
        )
        .await
    }

    async fn snapshot_detail(&self, snapshot_id: i64) -> Result<Reply> {
        self.call(
            "snapshot_detail",
            "/snapshot/detail",
            json!({"snapshotId": snapshot_id}),
        )
        .await
    }

    async fn restore_detail(&self, restore_id: i64) -> Result<Reply> {
        self.call(
            "restore_detail",
            "/restore/detail",
            json!({"restoreId": restore_id}),
        )
        .await
    }

    async fn clone_detail(&self, clone_id: i64, name: &str) -> Result<Reply> {
        self.call(
            "clone_detail",
            "/clone/detail",
            json!({"cloneId": clone_id, "volumeName": name}),
        )
        .await
    }

    async fn system_information_list(&self) -> Result<Reply> {
        self.call("system_information_list", "/system/information", json!({}))
            .await
    }
}
