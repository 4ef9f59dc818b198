use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Default location of the remote classification documents.
///
/// `{version}` is replaced by [`RemoteDataSettings::version`] so that a new
/// deployment busts CDN caches.
pub const DEFAULT_DATA_BASE_URL: &str = "https://testingcf.jsdelivr.net/gh/The-poem-of-destiny/FrontEnd-for-destined-journey@{version}/public/assets/data";

/// Application configuration from `DLC Manager.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "Remote_Data", default)]
    pub remote: RemoteDataSettings,

    #[serde(rename = "Registry", default)]
    pub registry: RegistrySettings,

    #[serde(rename = "Logging", default)]
    pub logging: LoggingSettings,
}

/// Where the core classification and special-recommend documents come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDataSettings {
    #[serde(rename = "Base URL", default = "default_base_url")]
    pub base_url: String,

    #[serde(rename = "Version", default = "default_version")]
    pub version: String,

    #[serde(rename = "Timeout Seconds", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteDataSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteDataSettings {
    /// Base URL with the version token substituted.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .replace("{version}", &self.version)
            .trim_end_matches('/')
            .to_string()
    }
}

/// World-book snapshot used by the standalone binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(rename = "Snapshot Path", default = "default_snapshot_path")]
    pub snapshot_path: Utf8PathBuf,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(rename = "Log Dir", default = "default_log_dir")]
    pub log_dir: String,

    #[serde(rename = "Log Prefix", default = "default_log_prefix")]
    pub log_prefix: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Console Output", default = "default_console_output")]
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            debug_mode: false,
            console_output: default_console_output(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_DATA_BASE_URL.to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_snapshot_path() -> Utf8PathBuf {
    Utf8PathBuf::from("worldbook.yaml")
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "dlc-manager".to_string()
}

fn default_console_output() -> bool {
    true
}
