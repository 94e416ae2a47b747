use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::constants::*;
use crate::error::{AnalysisError, Result};

const ENDPOINT_ENV: &str = "AGVISION_ENDPOINT";
const MODEL_ENV: &str = "AGVISION_MODEL";
const PROMPT_ENV: &str = "AGVISION_PROMPT";
const TIMEOUT_ENV: &str = "AGVISION_TIMEOUT_SECS";
const DASHBOARD_ADDR_ENV: &str = "AGVISION_DASHBOARD_ADDR";
const UPLOAD_DIR_ENV: &str = "AGVISION_UPLOAD_DIR";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    endpoint: Option<String>,
    model: Option<String>,
    prompt: Option<String>,
    timeout_secs: Option<u64>,
    api_key_path: Option<PathBuf>,
    dashboard: Option<DashboardConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DashboardConfigFile {
    addr: Option<String>,
    max_upload_bytes: Option<usize>,
    upload_dir: Option<PathBuf>,
    read_timeout_secs: Option<u64>,
}

/// Everything the detection client needs besides the credential.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub endpoint: Url,
    pub model: String,
    pub prompt: String,
    pub timeout: Duration,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(AGENTIC_DETECTION_ENDPOINT)
                .expect("default endpoint is a valid URL"),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Opaque detection API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty or whitespace-only value.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
    /// Directory for staged uploads. `None` uses the system temp dir.
    pub upload_dir: Option<PathBuf>,
    /// Deadline for a client to deliver its full request.
    pub read_timeout: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_DASHBOARD_ADDR
                .parse()
                .expect("default dashboard address is valid"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: None,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub api_key: Option<ApiKey>,
    pub dashboard: DashboardSettings,
}

impl AppConfig {
    /// Loads the optional file named by `AGVISION_CONFIG`, then applies the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(None, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`], with an explicit file path (taking precedence over
    /// `AGVISION_CONFIG`) and an injected environment lookup.
    pub fn load_with<F>(config_path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_PATH_ENV).map(PathBuf::from));
        let file = match path.as_deref() {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let mut cfg = Self::from_file(file)?;
        cfg.apply_env(&env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Replaces the prompt, applying the same checks as [`AppConfig::load`].
    pub fn override_prompt(&mut self, prompt: impl Into<String>) -> Result<()> {
        self.detection.prompt = prompt.into();
        self.validate()
    }

    pub fn require_api_key(&self) -> Result<ApiKey> {
        self.api_key
            .clone()
            .ok_or(AnalysisError::MissingCredential(API_KEY_ENV))
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let defaults = DetectionConfig::default();
        let endpoint = match file.endpoint {
            Some(raw) => parse_endpoint(&raw)?,
            None => defaults.endpoint,
        };
        let detection = DetectionConfig {
            endpoint,
            model: file.model.unwrap_or(defaults.model),
            prompt: file.prompt.unwrap_or(defaults.prompt),
            timeout: file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        let api_key = match file.api_key_path {
            Some(path) => read_secret_file(&path)?,
            None => None,
        };

        let mut dashboard = DashboardSettings::default();
        if let Some(section) = file.dashboard {
            if let Some(addr) = section.addr {
                dashboard.addr = parse_addr(&addr)?;
            }
            if let Some(limit) = section.max_upload_bytes {
                dashboard.max_upload_bytes = limit;
            }
            dashboard.upload_dir = section.upload_dir;
            if let Some(secs) = section.read_timeout_secs {
                dashboard.read_timeout = Duration::from_secs(secs);
            }
        }

        Ok(Self {
            detection,
            api_key,
            dashboard,
        })
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = env(ENDPOINT_ENV) {
            self.detection.endpoint = parse_endpoint(&raw)?;
        }
        if let Some(model) = env(MODEL_ENV) {
            self.detection.model = model;
        }
        if let Some(prompt) = env(PROMPT_ENV) {
            self.detection.prompt = prompt;
        }
        if let Some(raw) = env(TIMEOUT_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AnalysisError::Configuration(format!("{TIMEOUT_ENV} must be whole seconds"))
            })?;
            self.detection.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = env(DASHBOARD_ADDR_ENV) {
            self.dashboard.addr = parse_addr(&raw)?;
        }
        if let Some(dir) = env(UPLOAD_DIR_ENV) {
            self.dashboard.upload_dir = Some(PathBuf::from(dir));
        }
        // The environment wins over a secret file; an empty value counts as unset.
        if let Some(key) = env(API_KEY_ENV).and_then(ApiKey::new) {
            self.api_key = Some(key);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.detection.model.trim().is_empty() {
            return Err(AnalysisError::Configuration("model must not be empty".into()));
        }
        if self.detection.prompt.trim().is_empty() {
            return Err(AnalysisError::Configuration("prompt must not be empty".into()));
        }
        if self.detection.timeout.is_zero() {
            return Err(AnalysisError::Configuration(
                "timeout must be greater than zero".into(),
            ));
        }
        if self.dashboard.max_upload_bytes == 0 {
            return Err(AnalysisError::Configuration(
                "dashboard max_upload_bytes must be greater than zero".into(),
            ));
        }
        if self.dashboard.read_timeout.is_zero() {
            return Err(AnalysisError::Configuration(
                "dashboard read_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        AnalysisError::Configuration(format!("read config {}: {err}", path.display()))
    })?;
    toml::from_str(&raw).map_err(|err| {
        AnalysisError::Configuration(format!("parse config {}: {err}", path.display()))
    })
}

fn read_secret_file(path: &Path) -> Result<Option<ApiKey>> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        AnalysisError::Configuration(format!("read api key file {}: {err}", path.display()))
    })?;
    Ok(ApiKey::new(raw))
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| AnalysisError::Configuration(format!("endpoint '{raw}': {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AnalysisError::Configuration(format!(
            "endpoint scheme '{other}' unsupported; expected http(s)"
        ))),
    }
}

fn parse_addr(raw: &str) -> Result<SocketAddr> {
    raw.trim().parse().map_err(|err| {
        AnalysisError::Configuration(format!("dashboard address '{raw}': {err}"))
    })
}
