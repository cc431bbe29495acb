//! SDK configuration.
//!
//! Stored as JSON, by default at `<config dir>/sendbox/sdk.json`. Missing
//! fields fall back to defaults, and an unreadable file is logged and
//! replaced by defaults rather than failing startup.

use std::path::{Path, PathBuf};

use sendbox_tree::FolderIdPolicy;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// SDK configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SdkConfig {
    /// Directory holding the node store and other local state.
    pub data_dir: PathBuf,

    /// Node store file name inside `data_dir`.
    pub store_file: String,

    /// How synthesized folder ids are assigned.
    pub folder_id_policy: FolderIdPolicy,

    /// Tracing filter installed by `TransferSdk::from_config_file` when
    /// `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store_file: "nodes.json".into(),
            folder_id_policy: FolderIdPolicy::Derived,
            log_filter: "info,sendbox=debug".into(),
        }
    }
}

impl SdkConfig {
    /// Config rooted at `data_dir` with every other field defaulted.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Full path of the node store file.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, SdkError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<SdkConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse sdk config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), SdkError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Default config file location.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("sendbox").join("sdk.json"))
}

fn default_data_dir() -> PathBuf {
    data_dir()
        .map(|d| d.join("sendbox"))
        .unwrap_or_else(|| std::env::temp_dir().join("sendbox"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}

/// Returns the platform-specific data directory.
fn data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".local").join("share"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        config_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SdkConfig::load(&tmp.path().join("sdk.json")).unwrap();
        assert_eq!(config, SdkConfig::default());
        assert_eq!(config.store_file, "nodes.json");
        assert_eq!(config.folder_id_policy, FolderIdPolicy::Derived);
    }

    #[test]
    fn save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("sdk.json");

        let mut config = SdkConfig::with_data_dir(tmp.path().join("data"));
        config.folder_id_policy = FolderIdPolicy::Random;
        config.save(&path).unwrap();

        let loaded = SdkConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.store_path(), tmp.path().join("data").join("nodes.json"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sdk.json");
        std::fs::write(&path, r#"{"folderIdPolicy": "random"}"#).unwrap();

        let loaded = SdkConfig::load(&path).unwrap();
        assert_eq!(loaded.folder_id_policy, FolderIdPolicy::Random);
        assert_eq!(loaded.store_file, "nodes.json");
        assert_eq!(loaded.log_filter, "info,sendbox=debug");
    }

    #[test]
    fn default_config_path_is_under_sendbox() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("sendbox/sdk.json"));
        }
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sdk.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = SdkConfig::load(&path).unwrap();
        assert_eq!(loaded, SdkConfig::default());
    }
}
