use crate::types::OperationKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub backend_name: Option<String>,
    pub client: ClientConfig,
    pub volumes: VolumeConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the DISCO REST server.
    pub rest_ip: Option<String>,
    pub src_api_port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Prefix that marks DISCO volumes created through this driver.
    pub name_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub snapshot_check_timeout: u64,
    pub restore_check_timeout: u64,
    pub clone_check_timeout: u64,
    /// Seconds between two detail queries.
    pub retry_interval: u64,
}

impl MonitorConfig {
    pub fn timeout_for(&self, kind: OperationKind) -> Duration {
        let secs = match kind {
            OperationKind::SnapshotDetail => self.snapshot_check_timeout,
            OperationKind::RestoreDetail => self.restore_check_timeout,
            OperationKind::CloneDetail => self.clone_check_timeout,
        };
        Duration::from_secs(secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rest_ip: None,
            src_api_port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            name_prefix: "openstack-".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            snapshot_check_timeout: 3600,
            restore_check_timeout: 3600,
            clone_check_timeout: 3600,
            retry_interval: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            backend_name: None,
            client: ClientConfig::default(),
            volumes: VolumeConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Reads the configuration at `path`, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)
                .map_err(|e| crate::DiscoError::ConfigError(e.to_string()))?;
            debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(config_dir) = path.parent() {
            std::fs::create_dir_all(config_dir)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| crate::DiscoError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> crate::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            crate::DiscoError::ConfigError("Cannot determine home directory".to_string())
        })?;
        Ok(home.join(".disco").join("config.yaml"))
    }

    /// Checks the prerequisites the driver needs before it can talk to DISCO.
    pub fn validate(&self) -> crate::Result<()> {
        match self.client.rest_ip.as_deref() {
            Some(ip) if !ip.trim().is_empty() => {}
            _ => {
                return Err(crate::DiscoError::ConfigError(
                    "Could not find the IP address of the REST server".to_string(),
                ));
            }
        }

        if self.monitor.retry_interval == 0 {
            return Err(crate::DiscoError::ConfigError(
                "retry_interval must be greater than zero".to_string(),
            ));
        }

        for kind in OperationKind::ALL {
            let timeout = self.monitor.timeout_for(kind);
            if timeout.is_zero() {
                return Err(crate::DiscoError::ConfigError(format!(
                    "{kind} check timeout must be greater than zero"
                )));
            }
            if self.monitor.poll_interval() >= timeout {
                warn!(
                    "retry_interval {:?} is not shorter than the {} timeout {:?}",
                    self.monitor.poll_interval(),
                    kind,
                    timeout
                );
            }
        }

        Ok(())
    }

    pub fn base_url(&self) -> crate::Result<String> {
        let ip = self.client.rest_ip.as_deref().ok_or_else(|| {
            crate::DiscoError::ConfigError(
                "Could not find the IP address of the REST server".to_string(),
            )
        })?;
        Ok(format!("http://{}:{}/disco", ip, self.client.src_api_port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.client.request_timeout_secs)
    }
}
