use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fs, path::PathBuf, time::Duration};

use crate::{
    category::{PerCategory, RequestCategory},
    keys::{Credential, KeyRegistry},
};

pub const DEFAULT_BASE_URL: &str = "https://api.tomorrow.io/v4";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Primary key variable; further keys use `TOMORROW_API_KEY2` .. `TOMORROW_API_KEY9`.
pub const ENV_API_KEY: &str = "TOMORROW_API_KEY";
pub const ENV_UNITS: &str = "TOMORROW_API_UNITS";
pub const ENV_BASE_URL: &str = "TOMORROW_BASE_URL";
const MAX_ENV_KEYS: usize = 9;

/// Measurement system requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow!("Unknown units '{value}'. Supported units: metric, imperial.")),
        }
    }
}

/// Per-category fallback orders, as indices into `api_keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackOrders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical: Option<Vec<usize>>,
}

impl FallbackOrders {
    pub fn order(&self, category: RequestCategory) -> Option<&[usize]> {
        match category {
            RequestCategory::Current => self.current.as_deref(),
            RequestCategory::Forecast => self.forecast.as_deref(),
            RequestCategory::Historical => self.historical.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.forecast.is_none() && self.historical.is_none()
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_keys = ["first", "second", "third"]
/// units = "metric"
///
/// [fallback]
/// current = [0, 1, 2]
/// forecast = [1, 2, 0]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Categories without an explicit order use the key list rotated so that
    /// each category starts from a different key.
    #[serde(default, skip_serializing_if = "FallbackOrders::is_empty")]
    pub fallback: FallbackOrders,
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Config file overlaid with the process environment.
    pub fn load_with_env() -> Result<Self> {
        Self::load()?.with_env(|name| std::env::var(name).ok())
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from environment variables. Keys found in the
    /// environment replace the ones from the file.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_keys: Vec<String> = (1..=MAX_ENV_KEYS)
            .map(|n| if n == 1 { ENV_API_KEY.to_string() } else { format!("{ENV_API_KEY}{n}") })
            .filter_map(|name| lookup(&name))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .fold(Vec::new(), |mut keys, key| {
                if !keys.contains(&key) {
                    keys.push(key);
                }
                keys
            });

        if !env_keys.is_empty() {
            self.api_keys = env_keys;
        }

        if let Some(units) = lookup(ENV_UNITS) {
            self.units = Some(
                Units::try_from(units.as_str()).with_context(|| format!("Invalid {ENV_UNITS}"))?,
            );
        }

        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = Some(url);
        }

        Ok(self)
    }

    /// Add an API key unless it is already configured.
    pub fn add_api_key(&mut self, key: String) -> bool {
        let key = key.trim().to_string();
        if key.is_empty() || self.api_keys.contains(&key) {
            return false;
        }
        self.api_keys.push(key);
        true
    }

    pub fn credentials(&self) -> Vec<Credential> {
        self.api_keys.iter().cloned().map(Credential::new).collect()
    }

    /// Build the fallback chains for every category.
    pub fn key_registry(&self) -> Result<KeyRegistry> {
        if self.api_keys.is_empty() {
            return Err(anyhow!(
                "No API keys configured.\n\
                 Hint: run `weather configure` or set {ENV_API_KEY} in the environment."
            ));
        }

        let credentials = self.credentials();
        if self.fallback.is_empty() {
            // A key listed twice in the file is rotated once.
            let mut unique: Vec<Credential> = Vec::with_capacity(credentials.len());
            for credential in credentials {
                if !unique.contains(&credential) {
                    unique.push(credential);
                }
            }
            return KeyRegistry::rotated(&unique);
        }

        let count = credentials.len();
        let orders = PerCategory::from_fn(|category| match self.fallback.order(category) {
            Some(order) => order.to_vec(),
            None => (0..count).map(|i| (i + category.index()) % count).collect(),
        });

        KeyRegistry::from_orders(&credentials, &orders)
            .context("Invalid [fallback] section in configuration")
    }
}
