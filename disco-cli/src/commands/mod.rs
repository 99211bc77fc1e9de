mod config;
mod snapshot;
mod stats;
mod volume;
mod watch;

use clap::Subcommand;
use disco_core::{Config, Result};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage DISCO volumes
    Volume {
        #[command(subcommand)]
        action: VolumeAction,
    },

    /// Manage DISCO snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Wait for an operation that is already running on DISCO
    Watch {
        /// Operation kind (snapshot_detail, restore_detail, clone_detail)
        kind: String,

        /// Operation id returned by DISCO when the operation was started
        #[arg(long)]
        id: i64,

        /// Target volume name, required for clone_detail
        #[arg(long)]
        volume_name: Option<String>,

        /// Timeout in seconds (defaults to the configured check timeout)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show backend capacity and driver information
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum VolumeAction {
    /// Create an empty volume
    Create {
        /// Volume size (e.g., 20GB)
        #[arg(long)]
        size: String,

        /// Volume id (a random UUID when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a volume
    Delete {
        /// DISCO volume id
        volume: String,
    },

    /// Grow a volume
    Extend {
        /// DISCO volume id
        volume: String,

        /// New volume size (e.g., 40GB)
        #[arg(long)]
        size: String,
    },

    /// Create a volume from a snapshot and wait for the restore
    Restore {
        /// DISCO snapshot id
        snapshot: String,

        /// Id of the new volume (a random UUID when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Clone a volume and wait for the copy to finish
    Clone {
        /// DISCO id of the source volume
        source: String,

        /// Id of the new volume (a random UUID when omitted)
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotAction {
    /// Snapshot a volume and wait until DISCO reports it done
    Create {
        /// DISCO volume id
        volume: String,

        /// Snapshot description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a snapshot
    Delete {
        /// DISCO snapshot id
        snapshot: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Address of the DISCO REST server
        #[arg(long)]
        rest_ip: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Check,
}

pub async fn execute(
    command: Command,
    config: Config,
    config_path: PathBuf,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Command::Volume { action } => volume::execute(action, config, format).await,
        Command::Snapshot { action } => snapshot::execute(action, config, format).await,
        Command::Watch {
            kind,
            id,
            volume_name,
            timeout,
        } => watch::execute(kind, id, volume_name, timeout, config, format).await,
        Command::Stats => stats::execute(config, format).await,
        Command::Config { action } => config::execute(action, config, config_path, format).await,
    }
}
