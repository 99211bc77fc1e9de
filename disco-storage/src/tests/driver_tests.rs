use super::{ScriptedClient, status_reply};
use crate::{Capacity, DiscoDriver, Snapshot, Volume};
use disco_core::{Config, DiscoError, OperationKind, Reply, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn test_config() -> Config {
    let mut config = Config::default();
    config.client.rest_ip = Some("127.0.0.1".to_string());
    config
}

fn driver_with(client: &Arc<ScriptedClient>, config: Config) -> DiscoDriver {
    DiscoDriver::new(client.clone(), config)
}

fn volume(id: &str, location: Option<&str>) -> Volume {
    Volume {
        id: id.to_string(),
        name: format!("volume-{id}"),
        size_gb: 10,
        provider_location: location.map(str::to_string),
    }
}

fn snapshot(id: &str, location: Option<&str>) -> Snapshot {
    Snapshot {
        id: id.to_string(),
        volume_id: "v1".to_string(),
        display_description: Some("nightly".to_string()),
        provider_location: location.map(str::to_string),
    }
}

fn accepted(result: serde_json::Value) -> Reply {
    Reply::new(0).with("result", result)
}

fn volume_detail(volume_id: serde_json::Value) -> Reply {
    Reply::new(0).with("volumeInfoResult", json!({"volumeId": volume_id}))
}

#[tokio::test]
async fn test_create_volume() -> Result<()> {
    let client = Arc::new(ScriptedClient::new().script("volume_create", [accepted(json!("4711"))]));
    let driver = driver_with(&client, test_config());

    let update = driver.create_volume(&volume("v1", None)).await?;

    assert_eq!(update.provider_location, "4711");
    assert_eq!(client.args("volume_create"), vec!["openstack-v1 10240"]);
    Ok(())
}

#[tokio::test]
async fn test_create_volume_rejected() {
    let client = Arc::new(
        ScriptedClient::new().script("volume_create", [Reply::new(2).with("result", "quota")]),
    );
    let driver = driver_with(&client, test_config());

    let err = driver.create_volume(&volume("v1", None)).await.unwrap_err();

    match err {
        DiscoError::BackendApi {
            operation,
            status,
            result,
        } => {
            assert_eq!(operation, "volume_create");
            assert_eq!(status, 2);
            assert_eq!(result, "quota");
        }
        other => panic!("expected BackendApi, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oversized_volume_is_rejected_before_any_call() {
    let client = Arc::new(ScriptedClient::new());
    let driver = driver_with(&client, test_config());

    let mut huge = volume("v1", Some("88"));
    huge.size_gb = u64::MAX / 1024 + 1;

    let err = driver.create_volume(&huge).await.unwrap_err();
    assert!(matches!(err, DiscoError::ConfigError(_)));

    let err = driver.extend_volume(&huge, u64::MAX).await.unwrap_err();
    assert!(matches!(err, DiscoError::ConfigError(_)));

    assert_eq!(client.total_calls(), 0);
}

#[tokio::test]
async fn test_delete_volume_needs_provider_location() {
    let client = Arc::new(ScriptedClient::new());
    let driver = driver_with(&client, test_config());

    let err = driver.delete_volume(&volume("v1", None)).await.unwrap_err();

    assert!(matches!(err, DiscoError::StorageError(_)));
    assert_eq!(client.total_calls(), 0);
}

#[tokio::test]
async fn test_delete_volume() -> Result<()> {
    let client = Arc::new(ScriptedClient::new().script("volume_delete", [accepted(json!(""))]));
    let driver = driver_with(&client, test_config());

    driver.delete_volume(&volume("v1", Some("88"))).await?;

    assert_eq!(client.args("volume_delete"), vec!["88"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_create_snapshot_waits_for_completion() -> Result<()> {
    let kind = OperationKind::SnapshotDetail;
    let client = Arc::new(
        ScriptedClient::new()
            .script("snapshot_create", [accepted(json!(55))])
            .script(
                "snapshot_detail",
                [status_reply(kind, 2), status_reply(kind, 1)],
            ),
    );
    let driver = driver_with(&client, test_config());

    let update = driver
        .create_snapshot(&snapshot("s1", None), &volume("v1", Some("88")))
        .await?;

    assert_eq!(update.provider_location, "55");
    assert_eq!(client.args("snapshot_create"), vec!["88 nightly"]);
    assert_eq!(client.args("snapshot_detail"), vec!["55", "55"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_create_snapshot_failure_is_wrapped() {
    let kind = OperationKind::SnapshotDetail;
    let client = Arc::new(
        ScriptedClient::new()
            .script("snapshot_create", [accepted(json!("56"))])
            .script("snapshot_detail", [status_reply(kind, 3)]),
    );
    let driver = driver_with(&client, test_config());

    let err = driver
        .create_snapshot(&snapshot("s1", None), &volume("v1", Some("88")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DiscoError::BackendOperation { ref operation, .. } if operation == "create_snapshot"
    ));
    assert!(matches!(
        err.root(),
        DiscoError::OperationFailed { kind: OperationKind::SnapshotDetail, .. }
    ));
}

#[tokio::test]
async fn test_create_snapshot_with_non_numeric_id() {
    let client = Arc::new(
        ScriptedClient::new().script("snapshot_create", [accepted(json!("not-an-id"))]),
    );
    let driver = driver_with(&client, test_config());

    let err = driver
        .create_snapshot(&snapshot("s1", None), &volume("v1", Some("88")))
        .await
        .unwrap_err();

    assert!(matches!(err, DiscoError::InvalidReply { .. }));
    assert_eq!(client.calls("snapshot_detail"), 0);
}

#[tokio::test]
async fn test_delete_snapshot() -> Result<()> {
    let client = Arc::new(ScriptedClient::new().script("snapshot_delete", [accepted(json!(""))]));
    let driver = driver_with(&client, test_config());

    driver.delete_snapshot(&snapshot("s1", Some("55"))).await?;

    assert_eq!(client.args("snapshot_delete"), vec!["55"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_create_volume_from_snapshot() -> Result<()> {
    let kind = OperationKind::RestoreDetail;
    let client = Arc::new(
        ScriptedClient::new()
            .script("restore_from_snapshot", [accepted(json!(7))])
            .script("restore_detail", [status_reply(kind, 1)])
            .script("volume_detail_by_name", [volume_detail(json!(901))]),
    );
    let driver = driver_with(&client, test_config());

    let update = driver
        .create_volume_from_snapshot(&volume("v2", None), &snapshot("s1", Some("55")))
        .await?;

    assert_eq!(update.provider_location, "901");
    assert_eq!(client.args("restore_from_snapshot"), vec!["55 openstack-v2"]);
    assert_eq!(client.args("restore_detail"), vec!["7"]);
    assert_eq!(client.args("volume_detail_by_name"), vec!["openstack-v2"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_create_volume_from_snapshot_query_failure() {
    let client = Arc::new(
        ScriptedClient::new()
            .script("restore_from_snapshot", [accepted(json!(7))])
            .script("restore_detail", [Reply::new(4)]),
    );
    let driver = driver_with(&client, test_config());

    let err = driver
        .create_volume_from_snapshot(&volume("v2", None), &snapshot("s1", Some("55")))
        .await
        .unwrap_err();

    assert!(matches!(
        err.root(),
        DiscoError::OperationQueryFailed { kind: OperationKind::RestoreDetail, status: 4 }
    ));
    assert_eq!(client.calls("volume_detail_by_name"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_create_cloned_volume() -> Result<()> {
    let kind = OperationKind::CloneDetail;
    let client = Arc::new(
        ScriptedClient::new()
            .script("volume_clone", [accepted(json!(11))])
            .script("clone_detail", [status_reply(kind, 2), status_reply(kind, 1)])
            .script("volume_detail_by_name", [volume_detail(json!("vol-77"))]),
    );
    let driver = driver_with(&client, test_config());

    let update = driver
        .create_cloned_volume(&volume("v3", None), &volume("v1", Some("88")))
        .await?;

    assert_eq!(update.provider_location, "vol-77");
    assert_eq!(client.args("volume_clone"), vec!["88 openstack-v3"]);
    assert_eq!(
        client.args("clone_detail"),
        vec!["11 openstack-v3", "11 openstack-v3"]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_create_cloned_volume_times_out() {
    let kind = OperationKind::CloneDetail;
    let client = Arc::new(
        ScriptedClient::new()
            .script("volume_clone", [accepted(json!(11))])
            .script("clone_detail", [status_reply(kind, 2)]),
    );
    let mut config = test_config();
    config.monitor.clone_check_timeout = 2;
    let driver = driver_with(&client, config);

    let err = driver
        .create_cloned_volume(&volume("v3", None), &volume("v1", Some("88")))
        .await
        .unwrap_err();

    match err.root() {
        DiscoError::OperationTimedOut { kind, elapsed, .. } => {
            assert_eq!(*kind, OperationKind::CloneDetail);
            assert!(elapsed.as_secs() > 2);
        }
        other => panic!("expected OperationTimedOut, got {other:?}"),
    }
    assert_eq!(client.calls("volume_detail_by_name"), 0);
}

#[tokio::test]
async fn test_extend_volume() -> Result<()> {
    let client = Arc::new(ScriptedClient::new().script("volume_extend", [accepted(json!(""))]));
    let driver = driver_with(&client, test_config());

    driver.extend_volume(&volume("v1", Some("88")), 20).await?;

    assert_eq!(client.args("volume_extend"), vec!["88 20480"]);
    Ok(())
}

#[tokio::test]
async fn test_volume_stats_reads_capacity() {
    let info = Reply::new(0).with(
        "propertyListResult",
        json!({"PropertyInfoList": [
            {"name": "totalCapacityGB", "value": "1024.5"},
            {"name": "freeCapacityGB", "value": 512},
            {"name": "hostname", "value": "disco-01"}
        ]}),
    );
    let client = Arc::new(ScriptedClient::new().script("system_information_list", [info]));
    let driver = driver_with(&client, test_config());

    let stats = driver.get_volume_stats(true).await;

    assert_eq!(stats.total_capacity_gb, Capacity::Known(1024.5));
    assert_eq!(stats.free_capacity_gb, Capacity::Known(512.0));
    assert_eq!(stats.volume_backend_name, "disco");
    assert_eq!(stats.storage_protocol, "disco");
    assert!(!stats.qos_support);

    // Cached stats are served without another round trip.
    driver.get_volume_stats(false).await;
    assert_eq!(client.calls("system_information_list"), 1);
}

#[tokio::test]
async fn test_volume_stats_unknown_on_error() {
    let client = Arc::new(
        ScriptedClient::new().script("system_information_list", [Reply::new(1)]),
    );
    let mut config = test_config();
    config.backend_name = Some("disco-gold".to_string());
    let driver = driver_with(&client, config);

    let stats = driver.get_volume_stats(false).await;

    assert_eq!(stats.total_capacity_gb, Capacity::Unknown);
    assert_eq!(stats.free_capacity_gb, Capacity::Unknown);
    assert_eq!(stats.volume_backend_name, "disco-gold");

    let rendered = serde_json::to_value(&stats).unwrap();
    assert_eq!(rendered["total_capacity_gb"], json!("unknown"));
    assert_eq!(rendered["QoS_support"], json!(false));
}

#[test]
fn test_local_path() {
    let client = Arc::new(ScriptedClient::new());
    let driver = driver_with(&client, test_config());

    assert_eq!(
        driver.local_path(&volume("v1", None)),
        PathBuf::from("/dev/dmsvolume-v1")
    );
}

#[test]
fn test_check_for_setup_error() {
    let client = Arc::new(ScriptedClient::new());

    assert!(driver_with(&client, test_config()).check_for_setup_error().is_ok());
    assert!(matches!(
        driver_with(&client, Config::default()).check_for_setup_error(),
        Err(DiscoError::ConfigError(_))
    ));
}
