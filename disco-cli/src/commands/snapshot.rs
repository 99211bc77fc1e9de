use crate::commands::SnapshotAction;
use crate::output::{OutputFormat, OutputFormatter, print_success, spinner};
use crate::utils::build_driver;
use disco_core::{Config, Result};
use disco_storage::{Snapshot, Volume};
use uuid::Uuid;

pub async fn execute(action: SnapshotAction, config: Config, format: OutputFormat) -> Result<()> {
    let driver = build_driver(config)?;

    match action {
        SnapshotAction::Create {
            volume,
            description,
        } => {
            let target = Volume {
                id: volume.clone(),
                name: format!("volume-{volume}"),
                size_gb: 0,
                provider_location: Some(volume.clone()),
            };
            let snapshot = Snapshot {
                id: Uuid::new_v4().to_string(),
                volume_id: volume.clone(),
                display_description: description,
                provider_location: None,
            };

            let bar = spinner(&format!("Snapshotting volume {volume}"));
            let result = driver.create_snapshot(&snapshot, &target).await;
            bar.finish_and_clear();
            let update = result?;

            match format {
                OutputFormat::Table => print_success(&format!(
                    "Snapshot of volume {} taken, DISCO id {}",
                    volume, update.provider_location
                )),
                _ => println!("{}", format.format(&update)),
            }
        }
        SnapshotAction::Delete { snapshot } => {
            driver
                .delete_snapshot(&Snapshot {
                    id: snapshot.clone(),
                    volume_id: String::new(),
                    display_description: None,
                    provider_location: Some(snapshot.clone()),
                })
                .await?;
            print_success(&format!("Snapshot {snapshot} deleted"));
        }
    }

    Ok(())
}
