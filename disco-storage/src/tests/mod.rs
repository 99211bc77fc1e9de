mod driver_tests;

use crate::DiscoClient;
use async_trait::async_trait;
use disco_core::{DiscoError, OperationKind, OperationParams, Reply, Result};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Client double that answers each method from a scripted queue.
///
/// The last reply of a queue repeats forever, which keeps "always ongoing"
/// scripts short.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    failures: Mutex<HashMap<&'static str, String>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, method: &'static str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(method, replies.into_iter().collect());
        self
    }

    pub fn fail(self, method: &'static str, cause: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(method, cause.to_string());
        self
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }

    pub fn args(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, method: &'static str, args: String) -> Result<Reply> {
        self.calls.lock().unwrap().push((method, args));

        if let Some(cause) = self.failures.lock().unwrap().get(method) {
            return Err(DiscoError::NetworkError {
                operation: method.to_string(),
                cause: cause.clone(),
            });
        }

        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(method)
            .ok_or_else(|| anyhow::anyhow!("no script for {method}"))?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply.ok_or_else(|| anyhow::anyhow!("script for {method} is empty").into())
    }
}

#[async_trait]
impl DiscoClient for ScriptedClient {
    async fn volume_create(&self, name: &str, size_mb: u64) -> Result<Reply> {
        self.next("volume_create", format!("{name} {size_mb}"))
    }

    async fn volume_delete(&self, volume_id: &str) -> Result<Reply> {
        self.next("volume_delete", volume_id.to_string())
    }

    async fn volume_extend(&self, volume_id: &str, new_size_mb: u64) -> Result<Reply> {
        self.next("volume_extend", format!("{volume_id} {new_size_mb}"))
    }

    async fn volume_clone(&self, src_volume_id: &str, name: &str) -> Result<Reply> {
        self.next("volume_clone", format!("{src_volume_id} {name}"))
    }

    async fn volume_detail_by_name(&self, name: &str) -> Result<Reply> {
        self.next("volume_detail_by_name", name.to_string())
    }

    async fn snapshot_create(&self, volume_id: &str, description: &str) -> Result<Reply> {
        self.next("snapshot_create", format!("{volume_id} {description}"))
    }

    async fn snapshot_delete(&self, snapshot_id: &str) -> Result<Reply> {
        self.next("snapshot_delete", snapshot_id.to_string())
    }

    async fn restore_from_snapshot(&self, snapshot_id: &str, name: &str) -> Result<Reply> {
        self.next("restore_from_snapshot", format!("{snapshot_id} {name}"))
    }

    async fn snapshot_detail(&self, snapshot_id: i64) -> Result<Reply> {
        self.next("snapshot_detail", snapshot_id.to_string())
    }

    async fn restore_detail(&self, restore_id: i64) -> Result<Reply> {
        self.next("restore_detail", restore_id.to_string())
    }

    async fn clone_detail(&self, clone_id: i64, name: &str) -> Result<Reply> {
        self.next("clone_detail", format!("{clone_id} {name}"))
    }

    async fn system_information_list(&self) -> Result<Reply> {
        self.next("system_information_list", String::new())
    }
}

pub fn detail_method(kind: OperationKind) -> &'static str {
    kind.as_str()
}

pub fn status_reply(kind: OperationKind, code: i64) -> Reply {
    match kind {
        OperationKind::SnapshotDetail => Reply::new(0)
            .with("result", 0)
            .with("snapshotInfoResult", json!({"status": code})),
        OperationKind::RestoreDetail => Reply::new(0)
            .with("result", 0)
            .with("restoreInfoResult", json!({"status": code})),
        OperationKind::CloneDetail => Reply::new(0).with("result", code),
    }
}

pub fn params_for(kind: OperationKind) -> OperationParams {
    match kind {
        OperationKind::SnapshotDetail => OperationParams::snapshot(11),
        OperationKind::RestoreDetail => OperationParams::restore(22),
        OperationKind::CloneDetail => OperationParams::clone_of(33, "openstack-clone"),
    }
}
