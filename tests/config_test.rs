//! Configuration loading tests
//!
//! Env-var tests mutate process state and run serially.

use imgbb_uploadr::config::{Config, ConfigError, ConfigLoader};
use serial_test::serial;
use std::io::Write;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_api_key_expanded_from_env() {
    std::env::set_var("IMGBB_TEST_API_KEY", "from-env");
    let file = write_config("uploader:\n  api_key: \"${IMGBB_TEST_API_KEY}\"\n");

    let config = Config::load(file.path()).unwrap();
    std::env::remove_var("IMGBB_TEST_API_KEY");

    assert_eq!(config.uploader.api_key.as_deref(), Some("from-env"));
}

#[test]
#[serial]
fn test_endpoint_default_used_when_var_missing() {
    std::env::remove_var("IMGBB_TEST_ENDPOINT");
    let config = ConfigLoader::parse(
        "uploader:\n  endpoint: \"${IMGBB_TEST_ENDPOINT:-http://localhost:8080/1/upload}\"\n",
    )
    .unwrap();

    assert_eq!(config.uploader.endpoint, "http://localhost:8080/1/upload");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_or_default(dir.path().join("nope.yaml")).unwrap();
    assert_eq!(config.codegen.max_concurrency, 64);
    assert!(config.uploader.api_key.is_none());
}

#[test]
fn test_missing_file_is_error_for_load() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(dir.path().join("nope.yaml"));
    assert!(matches!(result, Err(ConfigError::IoError(_))));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let file = write_config("uploader: [unclosed\n");
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_rules_partially_overridden() {
    let config = ConfigLoader::parse(
        "codegen:\n  rules:\n    description_tag: \"[esm] \"\n",
    )
    .unwrap();
    let rules = &config.codegen.rules;
    assert_eq!(rules.description_tag, "[esm] ");
    assert_eq!(rules.from_variant, "cjs");
    assert_eq!(rules.config_load_replacement, "import \"dotenv/config\";");
}
