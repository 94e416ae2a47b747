use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use agvision::{AnalysisError, AppConfig};
use tempfile::NamedTempFile;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let secret = write_file("file-secret\n");
    let config = write_file(&format!(
        r#"
endpoint = "http://127.0.0.1:9000/detect"
model = "agentic"
prompt = "sunflowers"
timeout_secs = 12
api_key_path = "{}"

[dashboard]
addr = "0.0.0.0:8080"
max_upload_bytes = 1048576
upload_dir = "/tmp/agvision-uploads"
"#,
        secret.path().display()
    ));

    let env = env_from(&[
        ("AGVISION_CONFIG", config.path().to_str().unwrap()),
        ("AGVISION_PROMPT", "roses"),
        ("AGVISION_TIMEOUT_SECS", "45"),
    ]);
    let cfg = AppConfig::load_with(None, env).expect("load config");

    assert_eq!(cfg.detection.endpoint.as_str(), "http://127.0.0.1:9000/detect");
    assert_eq!(cfg.detection.model, "agentic");
    assert_eq!(cfg.detection.prompt, "roses");
    assert_eq!(cfg.detection.timeout, Duration::from_secs(45));
    assert_eq!(cfg.require_api_key().unwrap().expose(), "file-secret");
    assert_eq!(cfg.dashboard.addr.to_string(), "0.0.0.0:8080");
    assert_eq!(cfg.dashboard.max_upload_bytes, 1_048_576);
    assert_eq!(
        cfg.dashboard.upload_dir,
        Some(PathBuf::from("/tmp/agvision-uploads"))
    );
}

#[test]
fn env_credential_wins_over_secret_file() {
    let secret = write_file("file-secret");
    let config = write_file(&format!("api_key_path = \"{}\"\n", secret.path().display()));

    let env = env_from(&[("LANDINGAI_API_KEY", "env-secret")]);
    let cfg = AppConfig::load_with(Some(config.path()), env).unwrap();
    assert_eq!(cfg.require_api_key().unwrap().expose(), "env-secret");
}

#[test]
fn explicit_path_wins_over_config_env() {
    let chosen = write_file("prompt = \"tulips\"\n");
    let ignored = write_file("prompt = \"daisies\"\n");

    let env = env_from(&[("AGVISION_CONFIG", ignored.path().to_str().unwrap())]);
    let cfg = AppConfig::load_with(Some(chosen.path()), env).unwrap();
    assert_eq!(cfg.detection.prompt, "tulips");
}

#[test]
fn unknown_keys_are_rejected() {
    let config = write_file("api_key = \"never-in-a-file\"\n");
    let err = AppConfig::load_with(Some(config.path()), env_from(&[])).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[test]
fn missing_config_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load_with(Some(dir.path().join("absent.toml").as_path()), env_from(&[]))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[test]
fn bad_dashboard_address_is_rejected() {
    let env = env_from(&[("AGVISION_DASHBOARD_ADDR", "localhost")]);
    let err = AppConfig::load_with(None, env).unwrap_err();
    assert!(err.to_string().contains("dashboard address"));
}
