use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://fixend.onrender.com/api";

static CREDENTIAL_FILE_NAME: &str = "token";
static LOG_FILE_NAME: &str = "tick.log";
static ENV_DATA_DIR: &str = "TICK_DATA_DIR";
static ENV_API_URL: &str = "TICK_API_URL";
static ENV_TIMEOUT_SECS: &str = "TICK_TIMEOUT_SECS";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "tick-cli", "tick"));

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    credential_path: PathBuf,
    api_url: Url,
    timeout: Option<Duration>,
}

impl AppConfig {
    /// Construct [`AppConfig`] by resolving the data directory and API base URL using the
    /// provided overrides, environment variables, and platform defaults.
    pub fn discover(
        data_dir_override: Option<PathBuf>,
        api_url_override: Option<String>,
    ) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir_override)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }
        let api_url = resolve_api_url(api_url_override)?;
        let mut config = Self::new(data_dir, api_url);
        config.timeout = resolve_timeout()?;
        Ok(config)
    }

    /// Construct [`AppConfig`] directly from a resolved data directory and API URL.
    pub fn new(data_dir: PathBuf, api_url: Url) -> Self {
        let credential_path = data_dir.join(CREDENTIAL_FILE_NAME);
        Self {
            data_dir,
            credential_path,
            api_url,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn credential_path(&self) -> &Path {
        &self.credential_path
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Parse and validate an API base URL. Only `http` and `https` bases are accepted.
pub fn parse_api_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim()).with_context(|| format!("invalid API URL '{input}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!(
            "invalid API URL '{}': unsupported scheme '{}'",
            input,
            other
        )),
    }
}

fn resolve_api_url(api_url_override: Option<String>) -> Result<Url> {
    if let Some(url) = api_url_override {
        return parse_api_url(&url);
    }

    if let Ok(env_url) = env::var(ENV_API_URL) {
        if !env_url.trim().is_empty() {
            return parse_api_url(&env_url);
        }
    }

    parse_api_url(DEFAULT_API_URL)
}

fn resolve_timeout() -> Result<Option<Duration>> {
    let Ok(raw) = env::var(ENV_TIMEOUT_SECS) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("tmp").join("dev-tick");
        return Ok(dev_dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(base) = BaseDirs::new() {
            return Ok(base.home_dir().join(".tick"));
        }
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".tick"));
    }

    Ok(env::current_dir()?.join(".tick"))
}
