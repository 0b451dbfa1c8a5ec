//! Server settings
//!
//! Loaded from an optional file plus environment variables with the
//! `FAQ_DIALOG_` prefix (e.g. `FAQ_DIALOG_SERVER__PORT=9000`).

use serde::Deserialize;

const ENV_PREFIX: &str = "FAQ_DIALOG";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dialog: DialogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enforce the CORS origin list
    #[serde(default)]
    pub cors_enabled: bool,
    /// Allowed CORS origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogSettings {
    /// Directory of `<project>__<version>.json` slot config documents
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    /// Slot predictor service base URL; static required lists when unset
    #[serde(default)]
    pub predictor_endpoint: Option<String>,
    /// Predictor call budget before falling back to the static list
    #[serde(default = "default_predictor_timeout_ms")]
    pub predictor_timeout_ms: u64,
    /// How often to sweep idle conversations
    #[serde(default = "default_idle_sweep_secs")]
    pub idle_sweep_secs: u64,
    /// Conversations idle longer than this are dropped
    #[serde(default = "default_idle_max_age_secs")]
    pub idle_max_age_secs: u64,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            predictor_endpoint: None,
            predictor_timeout_ms: default_predictor_timeout_ms(),
            idle_sweep_secs: default_idle_sweep_secs(),
            idle_max_age_secs: default_idle_max_age_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_config_dir() -> String {
    "./slot_configs".to_string()
}

fn default_predictor_timeout_ms() -> u64 {
    2_000
}

fn default_idle_sweep_secs() -> u64 {
    300
}

fn default_idle_max_age_secs() -> u64 {
    3_600
}

/// Load settings from an optional file, with env overrides on top.
pub fn load_settings(path: Option<&str>) -> Result<Settings, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path));
    }
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));
    builder.build()?.try_deserialize()
}
