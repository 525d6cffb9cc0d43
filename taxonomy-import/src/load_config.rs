/// `load_config` module: builds the [`ImporterConfig`] from the environment plus an optional YAML file.
///
/// Endpoints and credentials are only ever read from the environment (a `.env`
/// file is loaded by `main` beforehand). The YAML file is for non-secret
/// settings: publish locales and timing.
///
/// ```yaml
/// locales:
///   language: nl
///   publish: [nl, en]
/// tuning:
///   request_timeout_secs: 30
///   settle_delay_ms: 1000
///   record_delay_ms: 100
///   verify_after_create: true
/// ```
///
/// Locale codes are two lowercase letters with an optional region (`nl`, `nl-be`).
///
/// # Errors
/// Any missing variable, malformed locale or unreadable/unparsable file is an
/// `anyhow::Error` naming the culprit, surfaced at the CLI boundary.
use anyhow::{anyhow, Result};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use taxonomy_import_core::config::{
    DiscoveryConfig, ImporterConfig, Locales, PimConfig, Tuning,
};
use tracing::{error, info};

pub const DISCOVERY_API_URL: &str = "CRYSTALLIZE_DISCOVERY_API_URL";
pub const DISCOVERY_ACCESS_TOKEN: &str = "CRYSTALLIZE_DISCOVERY_ACCESS_TOKEN";
pub const PIM_API_URL: &str = "CRYSTALLIZE_PIM_API_URL";
pub const PIM_ACCESS_TOKEN_ID: &str = "CRYSTALLIZE_PIM_ACCESS_TOKEN_ID";
pub const PIM_ACCESS_TOKEN_SECRET: &str = "CRYSTALLIZE_PIM_ACCESS_TOKEN_SECRET";
pub const PIM_TENANT_ID: &str = "CRYSTALLIZE_PIM_TENANT_ID";

const LOCALE_PATTERN: &str = r"^[a-z]{2}(-[a-z]{2})?$";

/// Every variable [`load_config`] requires.
pub const REQUIRED_ENV: [&str; 6] = [
    DISCOVERY_API_URL,
    DISCOVERY_ACCESS_TOKEN,
    PIM_API_URL,
    PIM_ACCESS_TOKEN_ID,
    PIM_ACCESS_TOKEN_SECRET,
    PIM_TENANT_ID,
];

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    locales: Locales,
    #[serde(default)]
    tuning: Tuning,
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            Err(anyhow!("Environment variable {name} is empty"))
        }
        Err(e) => {
            error!(var = name, error = ?e, "Environment variable missing");
            Err(anyhow!("Environment variable {name} is not set"))
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    // An empty file means "all defaults".
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// The search language ends up inside the Discovery query text, so only plain
/// locale codes get through.
fn check_locales(locales: &Locales) -> Result<()> {
    if locales.publish.is_empty() {
        error!("locales.publish is empty");
        return Err(anyhow!("locales.publish must name at least one language"));
    }
    let pattern = Regex::new(LOCALE_PATTERN)?;
    let fields = std::iter::once(("locales.language", &locales.language))
        .chain(locales.publish.iter().map(|l| ("locales.publish", l)));
    for (field, value) in fields {
        if !pattern.is_match(value) {
            error!(field, value = %value, "Invalid locale code");
            return Err(anyhow!(
                "{field} contains invalid locale {value:?}; expected e.g. \"nl\" or \"nl-be\""
            ));
        }
    }
    Ok(())
}

/// Loads the optional YAML file and injects endpoints and secrets from the environment.
pub fn load_config(path: Option<&Path>) -> Result<ImporterConfig> {
    let file = match path {
        Some(path) => read_file_config(path)?,
        None => {
            info!("No config file given, using default locales and tuning");
            FileConfig::default()
        }
    };

    check_locales(&file.locales)?;

    let config = ImporterConfig {
        discovery: DiscoveryConfig {
            api_url: required_env(DISCOVERY_API_URL)?,
            access_token: required_env(DISCOVERY_ACCESS_TOKEN)?,
        },
        pim: PimConfig {
            api_url: required_env(PIM_API_URL)?,
            access_token_id: required_env(PIM_ACCESS_TOKEN_ID)?,
            access_token_secret: required_env(PIM_ACCESS_TOKEN_SECRET)?,
            tenant_id: required_env(PIM_TENANT_ID)?,
        },
        locales: file.locales,
        tuning: file.tuning,
    };
    config.trace_loaded();
    Ok(config)
}
