use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";
pub const DEFAULT_GREETING_MESSAGE: &str = "Hello!";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CHARS: u32 = 2000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: String,
    pub debug: bool,
    pub greeting: GreetingConfig,
    pub wolfram: WolframConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    pub default_message: String,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_GREETING_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WolframConfig {
    pub app_id: String,
    /// Request deadline in seconds.
    pub timeout: u64,
    pub use_bearer: bool,
    pub default_max_chars: u32,
}

impl Default for WolframConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            use_bearer: false,
            default_max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl WolframConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{name} has an invalid value: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("wolfram.timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("Wolfram Alpha AppID is required")]
    MissingAppId,
    #[error("failed to create Wolfram Alpha client: {message}")]
    HttpClient { message: String },
}

impl Config {
    /// Reads the YAML file at `path`, then applies overrides from the
    /// process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_with_env(&content, |name| env::var(name).ok()).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml_with_env<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?
        };

        config.apply_env(lookup)?;
        if config.wolfram.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LOG_PATH") {
            self.log = value;
        }
        if let Some(value) = lookup("DEBUG") {
            self.debug = parse_bool("DEBUG", value)?;
        }
        if let Some(value) = lookup("GREETING_DEFAULT_MESSAGE") {
            self.greeting.default_message = value;
        }
        if let Some(value) = lookup("WOLFRAM_APP_ID") {
            self.wolfram.app_id = value;
        }
        if let Some(value) = lookup("WOLFRAM_TIMEOUT") {
            self.wolfram.timeout = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "WOLFRAM_TIMEOUT",
                    value,
                })?;
        }
        if let Some(value) = lookup("WOLFRAM_USE_BEARER") {
            self.wolfram.use_bearer = parse_bool("WOLFRAM_USE_BEARER", value)?;
        }
        if let Some(value) = lookup("WOLFRAM_DEFAULT_MAX_CHARS") {
            self.wolfram.default_max_chars =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        name: "WOLFRAM_DEFAULT_MAX_CHARS",
                        value,
                    })?;
        }
        Ok(())
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { name, value }),
    }
}
