use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Everything the importer needs to talk to both remote APIs.
///
/// Endpoints and credentials come from the environment; `locales` and `tuning`
/// may come from an optional YAML file (see the CLI's `load_config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterConfig {
    pub discovery: DiscoveryConfig,
    pub pim: PimConfig,
    #[serde(default)]
    pub locales: Locales,
    #[serde(default)]
    pub tuning: Tuning,
}

impl ImporterConfig {
    pub fn trace_loaded(&self) {
        info!(
            discovery_url = %self.discovery.api_url,
            pim_url = %self.pim.api_url,
            tenant_id = %self.pim.tenant_id,
            language = %self.locales.language,
            publish = ?self.locales.publish,
            "Loaded ImporterConfig"
        );
        debug!(tuning = ?self.tuning, "Importer tuning");
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub api_url: String,
    pub access_token: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PimConfig {
    pub api_url: String,
    pub access_token_id: String,
    pub access_token_secret: String,
    pub tenant_id: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for DiscoveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryConfig")
            .field("api_url", &self.api_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for PimConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PimConfig")
            .field("api_url", &self.api_url)
            .field("access_token_id", &self.access_token_id)
            .field("access_token_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Languages used for creating and publishing folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locales {
    /// Language folders are created in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Every new folder is published in each of these.
    #[serde(default = "default_publish")]
    pub publish: Vec<String>,
}

fn default_language() -> String {
    "nl".to_string()
}

fn default_publish() -> Vec<String> {
    vec!["nl".to_string(), "en".to_string()]
}

impl Default for Locales {
    fn default() -> Self {
        Self {
            language: default_language(),
            publish: default_publish(),
        }
    }
}

/// Timeouts and fixed pauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause after a create before asking Discovery for the real path.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause after each record that hit the remote APIs.
    #[serde(default = "default_record_delay_ms")]
    pub record_delay_ms: u64,
    #[serde(default = "default_verify_after_create")]
    pub verify_after_create: bool,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_record_delay_ms() -> u64 {
    100
}

fn default_verify_after_create() -> bool {
    true
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            record_delay_ms: default_record_delay_ms(),
            verify_after_create: default_verify_after_create(),
        }
    }
}

impl Tuning {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn record_delay(&self) -> Duration {
        Duration::from_millis(self.record_delay_ms)
    }
}
