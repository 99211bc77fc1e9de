use crate::commands::VolumeAction;
use crate::output::{OutputFormat, OutputFormatter, print_info, print_success, spinner};
use crate::utils::{build_driver, parse_size_gb};
use disco_core::{Config, Result};
use disco_storage::{ModelUpdate, Snapshot, Volume};
use uuid::Uuid;

pub async fn execute(action: VolumeAction, config: Config, format: OutputFormat) -> Result<()> {
    let driver = build_driver(config)?;

    match action {
        VolumeAction::Create { size, id } => {
            let volume = new_volume(id, parse_size_gb(&size)?);
            print_info(&format!("Creating volume {} ({}GB)", volume.id, volume.size_gb));

            let update = driver.create_volume(&volume).await?;
            report(&volume, &update, format);
        }
        VolumeAction::Delete { volume } => {
            driver.delete_volume(&existing_volume(volume.clone(), 0)).await?;
            print_success(&format!("Volume {volume} deleted"));
        }
        VolumeAction::Extend { volume, size } => {
            let size_gb = parse_size_gb(&size)?;
            driver
                .extend_volume(&existing_volume(volume.clone(), 0), size_gb)
                .await?;
            print_success(&format!("Volume {volume} extended to {size_gb}GB"));
        }
        VolumeAction::Restore { snapshot, id } => {
            let volume = new_volume(id, 0);
            let snapshot = Snapshot {
                id: snapshot.clone(),
                volume_id: String::new(),
                display_description: None,
                provider_location: Some(snapshot),
            };

            let bar = spinner(&format!("Restoring snapshot {} into {}", snapshot.id, volume.id));
            let result = driver.create_volume_from_snapshot(&volume, &snapshot).await;
            bar.finish_and_clear();

            report(&volume, &result?, format);
        }
        VolumeAction::Clone { source, id } => {
            let volume = new_volume(id, 0);
            let source = existing_volume(source, 0);

            let bar = spinner(&format!("Cloning volume {} into {}", source.id, volume.id));
            let result = driver.create_cloned_volume(&volume, &source).await;
            bar.finish_and_clear();

            report(&volume, &result?, format);
        }
    }

    Ok(())
}

fn new_volume(id: Option<String>, size_gb: u64) -> Volume {
    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
    Volume {
        name: format!("volume-{id}"),
        id,
        size_gb,
        provider_location: None,
    }
}

fn existing_volume(disco_id: String, size_gb: u64) -> Volume {
    Volume {
        id: disco_id.clone(),
        name: format!("volume-{disco_id}"),
        size_gb,
        provider_location: Some(disco_id),
    }
}

fn report(volume: &Volume, update: &ModelUpdate, format: OutputFormat) {
    match format {
        OutputFormat::Table => print_success(&format!(
            "Volume {} ready, DISCO id {}",
            volume.id, update.provider_location
        )),
        _ => println!("{}", format.format(update)),
    }
}
