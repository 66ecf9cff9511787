mod basic;
mod remote;
mod sync;

pub use basic::BasicConfig;
pub use remote::RemoteConfig;
pub use sync::SyncConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Storage, logging and HTTP listener (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Export API endpoints and credentials (see `remote` table in config.toml).
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Batch sizes and scheduling of sync passes (see `sync` table in config.toml).
    #[serde(default)]
    pub sync: SyncConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "ZYWRAP_";

impl Config {
    /// Builds a Figment that merges defaults, a config TOML file and
    /// `ZYWRAP_`-prefixed environment variables (`ZYWRAP_REMOTE__API_KEY`).
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if file.is_file() {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration. An explicit `path` must exist; the default
    /// `config.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, SyncError> {
        if let Some(path) = path
            && !path.is_file()
        {
            return Err(SyncError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::figment(path)
            .extract()
            .map_err(|err| SyncError::Config(format!("failed to extract configuration: {err}")))
    }

    /// Commands that reach the export API need a key.
    pub fn validate_remote(&self) -> Result<(), SyncError> {
        if self.remote.api_key.trim().is_empty() {
            return Err(SyncError::Config(
                "remote.api_key must be set and non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_a_file() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();
        assert_eq!(cfg.sync.upsert_batch_size, 1000);
        assert_eq!(cfg.sync.delete_batch_size, 2000);
        assert!(cfg.validate_remote().is_err());
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [remote]
                api_key = 12345
                request_timeout_secs = 5

                [sync]
                upsert_batch_size = 10
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(cfg.remote.api_key, "12345");
        assert_eq!(cfg.remote.request_timeout_secs, 5);
        assert_eq!(cfg.sync.upsert_batch_size, 10);
        assert!(cfg.validate_remote().is_ok());
    }
}
