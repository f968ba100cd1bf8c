use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::tarball::error::RegistryError;

// =============================================================================
// File names
// =============================================================================

/// Name of the persisted registry document inside the configuration directory
pub const REGISTRY_FILE_NAME: &str = "tarball-list.json";

/// Name of the optional settings file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Name of the log file inside the configuration directory
pub const LOG_FILE_NAME: &str = "tarball-registry.log";

/// Base of the download URL for guessed tarballs, completed with `-<short version>/<name>`
pub const DEFAULT_DOWNLOAD_URL: &str = "https://dev.mysql.com/get/Downloads/MySQL";

pub const DEFAULT_LINUX_NAME_TEMPLATE: &str =
    "mysql-{{.Version}}-linux-glibc2.17-x86_64{{.Minimal}}.{{.Ext}}";

pub const DEFAULT_DARWIN_NAME_TEMPLATE: &str = "mysql-{{.Version}}-macos14-arm64.{{.Ext}}";

/// Short versions for which guess mode may synthesize a new patch release
pub const DEFAULT_GUESS_VERSIONS: &[&str] = &["5.7", "8.0", "8.1", "8.2", "8.3", "8.4", "9.0"];

/// Registry configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub guess: GuessConfig,
}

/// Guess-mode configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GuessConfig {
    pub download_url: String,
    pub allowed_versions: Vec<String>,
    /// Per operating system rules, keyed by lower-case OS name
    pub platforms: BTreeMap<String, PlatformGuessConfig>,
}

impl Default for GuessConfig {
    fn default() -> Self {
        Self {
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            allowed_versions: DEFAULT_GUESS_VERSIONS
                .iter()
                .map(|v| v.to_string())
                .collect(),
            platforms: BTreeMap::from([
                (
                    "linux".to_string(),
                    PlatformGuessConfig {
                        name_template: DEFAULT_LINUX_NAME_TEMPLATE.to_string(),
                        force_minimal: true,
                        default_extension: "tar.gz".to_string(),
                        extension_overrides: BTreeMap::from([(
                            "8.0".to_string(),
                            "tar.xz".to_string(),
                        )]),
                        template_data: BTreeMap::new(),
                    },
                ),
                (
                    "darwin".to_string(),
                    PlatformGuessConfig {
                        name_template: DEFAULT_DARWIN_NAME_TEMPLATE.to_string(),
                        force_minimal: false,
                        default_extension: "tar.gz".to_string(),
                        extension_overrides: BTreeMap::new(),
                        template_data: BTreeMap::new(),
                    },
                ),
            ]),
        }
    }
}

/// How to synthesize a tarball for one operating system
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformGuessConfig {
    /// File name template using the `Version`, `Ext` and `Minimal` fields
    pub name_template: String,
    pub force_minimal: bool,
    pub default_extension: String,
    /// Archive extension by short version, overriding `default_extension`
    pub extension_overrides: BTreeMap<String, String>,
    /// Extra template fields. `Version`, `Ext` and `Minimal` always win over these.
    pub template_data: BTreeMap<String, String>,
}

impl Default for PlatformGuessConfig {
    fn default() -> Self {
        Self {
            name_template: String::new(),
            force_minimal: false,
            default_extension: "tar.gz".to_string(),
            extension_overrides: BTreeMap::new(),
            template_data: BTreeMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Read the configuration from a JSON file.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| RegistryError::CorruptState {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the configuration directory for tarball-registry.
/// Uses $XDG_CONFIG_HOME/tarball-registry if XDG_CONFIG_HOME is set,
/// otherwise falls back to ~/.config/tarball-registry,
/// or ./tarball-registry if neither is available.
pub fn config_dir() -> PathBuf {
    config_dir_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the registry document.
pub fn registry_path() -> PathBuf {
    config_dir().join(REGISTRY_FILE_NAME)
}

/// Returns the path to the settings file.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}

fn config_dir_with_env(xdg_config_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("tarball-registry")
}
