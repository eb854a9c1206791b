use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{Result, ReviewerError};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_DESCRIPTIONS_TABLE: &str = "project_descriptions_db";
pub const DEFAULT_PROJECTS_TABLE: &str = "projects_db";
pub const DEFAULT_BUCKET: &str = "student-project-files";
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

const ENV_PREFIX: &str = "REVIEWER_";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    /// When set, repository URLs must point at this host.
    pub allowed_host: Option<String>,
    pub request_timeout: Option<Duration>,
    pub max_file_size: u64,
    /// Root of the local record/object store. `None` means the app data dir.
    pub data_dir: Option<PathBuf>,
    pub descriptions_table: String,
    pub projects_table: String,
    pub bucket: String,
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            allowed_host: None,
            request_timeout: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            data_dir: None,
            descriptions_table: DEFAULT_DESCRIPTIONS_TABLE.to_string(),
            projects_table: DEFAULT_PROJECTS_TABLE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl Config {
    /// Builds a config from `REVIEWER_*` values returned by `lookup`, falling
    /// back to defaults for anything unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Config::default();

        if let Some(url) = get("API_BASE_URL") {
            config.api_base_url = url;
        }
        config.allowed_host = get("ALLOWED_HOST");
        if let Some(secs) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Some(Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &secs)?));
        }
        if let Some(size) = get("MAX_FILE_SIZE") {
            config.max_file_size = parse_number("MAX_FILE_SIZE", &size)?;
        }
        config.data_dir = get("DATA_DIR").map(PathBuf::from);
        if let Some(table) = get("DESCRIPTIONS_TABLE") {
            config.descriptions_table = table;
        }
        if let Some(table) = get("PROJECTS_TABLE") {
            config.projects_table = table;
        }
        if let Some(bucket) = get("BUCKET") {
            config.bucket = bucket;
        }
        if let Some(theme) = get("THEME") {
            config.theme = theme;
        }

        Ok(config)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|e| {
        ReviewerError::Config(format!("{}{} must be a whole number, got '{}': {}", ENV_PREFIX, name, value, e))
    })
}

/// Loads the configuration from the process environment.
pub fn load_config() -> Result<Config> {
    let config = Config::from_lookup(|key| std::env::var(key).ok())?;
    log::debug!("Loaded config: {:?}", config);
    Ok(config)
}
