use crate::hub::HubConfig;
use crate::ingest::ingest_checkout;
use crate::snapshot::{CompatibilitySnapshot, DEFAULT_REPO_URL};
use crate::sync::{RepoSync, SyncPolicy, sync_repository};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the compatibility table comes from.
#[derive(Debug, Clone, Default)]
pub enum SnapshotSource {
    /// Table compiled into the binary.
    #[default]
    Vendored,
    /// A local optimum-intel checkout, optionally refreshed from `repo_url`
    /// before it is scanned.
    Checkout {
        dir: PathBuf,
        repo_url: String,
        sync: bool,
        policy: SyncPolicy,
    },
}

impl SnapshotSource {
    pub fn checkout(dir: impl Into<PathBuf>) -> Self {
        SnapshotSource::Checkout {
            dir: dir.into(),
            repo_url: DEFAULT_REPO_URL.to_string(),
            sync: true,
            policy: SyncPolicy::default(),
        }
    }

    pub fn load(&self) -> anyhow::Result<CompatibilitySnapshot> {
        match self {
            SnapshotSource::Vendored => {
                let snapshot = CompatibilitySnapshot::vendored()?;
                log::debug!(
                    "Using vendored snapshot of optimum-intel {}",
                    snapshot.optimum_intel_version()
                );
                Ok(snapshot)
            }
            SnapshotSource::Checkout {
                dir,
                repo_url,
                sync,
                policy,
            } => {
                if *sync {
                    sync_repository(&RepoSync::new(repo_url.clone(), dir.clone(), *policy))?;
                }
                let data = ingest_checkout(dir, repo_url)?;
                Ok(CompatibilitySnapshot::new(data)?)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    pub source: SnapshotSource,
    pub hub: HubConfig,
    pub server: ServerConfig,
}

impl CheckerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let endpoint = self.hub.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "hub_endpoint".to_string(),
                value: self.hub.endpoint.clone(),
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if self.hub.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if let SnapshotSource::Checkout { dir, repo_url, .. } = &self.source {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "checkout".to_string(),
                    value: String::new(),
                    reason: "checkout directory must not be empty".to_string(),
                });
            }
            if repo_url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "repo_url".to_string(),
                    value: repo_url.clone(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
