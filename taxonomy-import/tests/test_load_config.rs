use serial_test::serial;
use std::env;
use std::fs::write;
use taxonomy_import::load_config::{load_config, REQUIRED_ENV};
use tempfile::NamedTempFile;

fn set_all_env() {
    env::set_var("CRYSTALLIZE_DISCOVERY_API_URL", "https://api.example.test/discovery");
    env::set_var("CRYSTALLIZE_DISCOVERY_ACCESS_TOKEN", "discovery-token");
    env::set_var("CRYSTALLIZE_PIM_API_URL", "https://pim.example.test/graphql");
    env::set_var("CRYSTALLIZE_PIM_ACCESS_TOKEN_ID", "token-id");
    env::set_var("CRYSTALLIZE_PIM_ACCESS_TOKEN_SECRET", "token-secret");
    env::set_var("CRYSTALLIZE_PIM_TENANT_ID", "tenant-42");
}

fn yaml_file(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), content).unwrap();
    file
}

/// Without a file every non-secret setting falls back to its default.
#[test]
#[serial]
fn test_load_config_from_env_only() {
    set_all_env();

    let config = load_config(None).expect("Config should load from env");

    assert_eq!(config.discovery.api_url, "https://api.example.test/discovery");
    assert_eq!(config.pim.tenant_id, "tenant-42");
    assert_eq!(config.locales.language, "nl");
    assert_eq!(config.locales.publish, vec!["nl", "en"]);
    assert_eq!(config.tuning.settle_delay_ms, 1000);
    assert!(config.tuning.verify_after_create);
}

/// File values override defaults; fields left out keep theirs.
#[test]
#[serial]
fn test_load_config_with_partial_yaml() {
    set_all_env();
    let file = yaml_file(
        r#"
locales:
  publish: [nl]
tuning:
  settle_delay_ms: 2500
  record_delay_ms: 0
"#,
    );

    let config = load_config(Some(file.path())).expect("Config should load");

    assert_eq!(config.locales.language, "nl");
    assert_eq!(config.locales.publish, vec!["nl"]);
    assert_eq!(config.tuning.settle_delay_ms, 2500);
    assert_eq!(config.tuning.record_delay_ms, 0);
    assert_eq!(config.tuning.request_timeout_secs, 30);
}

#[test]
#[serial]
fn test_load_config_accepts_empty_file() {
    set_all_env();
    let file = yaml_file("");

    let config = load_config(Some(file.path())).expect("Empty file means defaults");
    assert_eq!(config.locales.publish.len(), 2);
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_env() {
    set_all_env();
    env::remove_var("CRYSTALLIZE_PIM_ACCESS_TOKEN_SECRET");

    let err = load_config(None).expect_err("Missing secret must fail");
    assert!(
        err.to_string().contains("CRYSTALLIZE_PIM_ACCESS_TOKEN_SECRET"),
        "error should name the variable, got: {err}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_empty_env() {
    set_all_env();
    env::set_var("CRYSTALLIZE_DISCOVERY_ACCESS_TOKEN", "   ");

    let err = load_config(None).expect_err("Blank token must fail");
    assert!(err.to_string().contains("is empty"));
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    set_all_env();
    let file = yaml_file("this is not: [valid, yaml");

    let err = load_config(Some(file.path())).expect_err("Invalid YAML must fail");
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    set_all_env();
    let file = yaml_file("tunning:\n  settle_delay_ms: 10\n");

    assert!(load_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_load_config_rejects_empty_publish_list() {
    set_all_env();
    let file = yaml_file("locales:\n  publish: []\n");

    assert!(load_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_load_config_rejects_malformed_language() {
    set_all_env();
    let file = yaml_file("locales:\n  language: \"nl }\"\n");

    let err = load_config(Some(file.path())).expect_err("Malformed language must fail");
    assert!(err.to_string().contains("locales.language"));
}

#[test]
#[serial]
fn test_load_config_rejects_malformed_publish_locale() {
    set_all_env();
    let file = yaml_file("locales:\n  publish: [nl, EN]\n");

    let err = load_config(Some(file.path())).expect_err("Uppercase locale must fail");
    assert!(err.to_string().contains("locales.publish"));
}

#[test]
#[serial]
fn test_load_config_accepts_regional_locale() {
    set_all_env();
    let file = yaml_file("locales:\n  language: nl-be\n  publish: [nl-be, en]\n");

    let config = load_config(Some(file.path())).expect("Regional locale should load");
    assert_eq!(config.locales.language, "nl-be");
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    set_all_env();

    let err = load_config(Some(std::path::Path::new("/no/such/importer.yaml")))
        .expect_err("Missing file must fail");
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn required_env_lists_every_variable() {
    assert_eq!(REQUIRED_ENV.len(), 6);
    assert!(REQUIRED_ENV.iter().all(|v| v.starts_with("CRYSTALLIZE_")));
}
