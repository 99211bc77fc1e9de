use crate::output::{OutputFormat, OutputFormatter, print_success, print_warning, spinner};
use crate::utils::build_driver;
use disco_core::{Config, DiscoError, OperationKind, OperationParams, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    kind: String,
    id: i64,
    volume_name: Option<String>,
    timeout: Option<u64>,
    config: Config,
    format: OutputFormat,
) -> Result<()> {
    let kind: OperationKind = kind.parse()?;
    let params = match kind {
        OperationKind::SnapshotDetail => OperationParams::snapshot(id),
        OperationKind::RestoreDetail => OperationParams::restore(id),
        OperationKind::CloneDetail => {
            let name = volume_name.ok_or_else(|| DiscoError::MissingParameter {
                kind,
                name: "vol_name".to_string(),
            })?;
            OperationParams::clone_of(id, name)
        }
    };
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.monitor.timeout_for(kind));

    let driver = build_driver(config)?;

    // Ctrl-C stops the wait without touching the backend operation.
    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let bar = spinner(&format!("Waiting for {kind} {id}"));
    let result = driver
        .monitor()
        .monitor_until_cancelled(kind, &params, timeout, &token)
        .await;
    bar.finish_and_clear();

    match result {
        Ok(reply) => {
            match format {
                OutputFormat::Table => print_success(&format!("{kind} {id} finished")),
                _ => println!("{}", format.format(reply.payload_value())),
            }
            Ok(())
        }
        Err(DiscoError::Cancelled { elapsed, .. }) => {
            print_warning(&format!(
                "Stopped waiting for {kind} {id} after {elapsed:?}; the operation keeps running on DISCO"
            ));
            Ok(())
        }
        Err(e) => Err(e),
    }
}
