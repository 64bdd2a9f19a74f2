use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::CourierError;

/// Top-level Courier configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Session pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Numbers dispatched per batch before the session stops itself.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Countdown between dispatches in auto mode, in seconds.
    #[serde(default = "default_auto_delay")]
    pub auto_delay_secs: u64,
    /// Prefilled chat message. Empty = open the chat without text.
    #[serde(default)]
    pub message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            auto_delay_secs: default_auto_delay(),
            message: String::new(),
        }
    }
}

/// Chat link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Base URL the per-number chat link is built on.
    #[serde(default = "default_dispatch_base")]
    pub base_url: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: default_dispatch_base(),
        }
    }
}

/// Remote CRM settings. The token is an opaque bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_crm_api_base")]
    pub api_base: String,
    /// Value written to the contact flag after outreach.
    #[serde(default = "default_flag_value")]
    pub flag_value: String,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            access_token: String::new(),
            api_base: default_crm_api_base(),
            flag_value: default_flag_value(),
        }
    }
}

/// Completion webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
}

// --- Default value functions ---

fn default_batch_size() -> u32 {
    10
}
fn default_auto_delay() -> u64 {
    15
}
fn default_dispatch_base() -> String {
    "https://wa.me".to_string()
}
fn default_crm_api_base() -> String {
    "https://www.zohoapis.com/crm/v2".to_string()
}
fn default_flag_value() -> String {
    "Yes".to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Zero pacing values
/// are clamped to 1 so the session invariants hold downstream.
pub fn load(path: &str) -> Result<Config, CourierError> {
    let path = Path::new(path);
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CourierError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| CourierError::Config(format!("failed to parse config: {e}")))?
    } else {
        info!("config file not found at {}, using defaults", path.display());
        Config::default()
    };

    if config.session.batch_size == 0 {
        warn!("session.batch_size must be positive, clamping to 1");
        config.session.batch_size = 1;
    }
    if config.session.auto_delay_secs == 0 {
        warn!("session.auto_delay_secs must be positive, clamping to 1");
        config.session.auto_delay_secs = 1;
    }

    Ok(config)
}
