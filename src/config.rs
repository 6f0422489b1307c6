//! Layered configuration: built-in defaults, then the TOML config file, then
//! `NEWRELIC_*` environment variables, then command-line flags. Later layers
//! win per field.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::client::ClientConfig;
use crate::identifiers::{AccountId, Region, validate_api_key};
use crate::time::parse_std_duration;

const CONFIG_DIR: &str = "newrelic-cli";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub account_id: String,
    pub region: String,
    pub timezone: String,
    pub timeout: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            account_id: String::new(),
            region: "US".to_string(),
            timezone: "UTC".to_string(),
            timeout: "30s".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    fn normalize(&mut self) {
        self.api_key = self.api_key.trim().to_string();
        self.account_id = self.account_id.trim().to_string();
        self.region = self.region.trim().to_ascii_uppercase();
        self.timezone = self.timezone.trim().to_string();
        self.timeout = self.timeout.trim().to_string();
        self.log_level = self.log_level.trim().to_string();
    }

    fn validate(&self) -> Result<()> {
        self.region
            .parse::<Region>()
            .with_context(|| format!("invalid region: {}", self.region))?;

        ensure_non_empty("timezone", &self.timezone)?;
        self.timezone
            .parse::<chrono_tz::Tz>()
            .with_context(|| format!("invalid timezone: {}", self.timezone))?;

        ensure_non_empty("timeout", &self.timeout)?;
        parse_std_duration(&self.timeout)
            .with_context(|| format!("invalid timeout: {}", self.timeout))?;

        ensure_non_empty("log_level", &self.log_level)?;

        if !self.account_id.is_empty() {
            AccountId::new(self.account_id.clone()).as_int()?;
        }

        Ok(())
    }

    /// The credential warning for a key that validates but does not look like
    /// a User API key. Hard validation failures come from [`validate_api_key`]
    /// at request time.
    pub fn api_key_warning(&self) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }
        validate_api_key(&self.api_key).ok().flatten()
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let region = self.region.parse::<Region>()?;
        let timeout = parse_std_duration(&self.timeout)
            .with_context(|| format!("invalid timeout: {}", self.timeout))?;

        Ok(ClientConfig {
            api_key: self.api_key.clone(),
            account_id: AccountId::new(self.account_id.clone()),
            region,
            timeout,
        })
    }

    /// Persists only the fields `config set-*` manages. The file is created
    /// with its parent directories on first write.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let rendered = toml::to_string_pretty(self).context("failed to render configuration")?;
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }
}

/// The config file path: `--config` / `NEWRELIC_CLI_CONFIG` when given,
/// otherwise `<config dir>/newrelic-cli/config.toml`.
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

pub fn load(cli: &Cli) -> Result<Config> {
    let path = config_file_path(cli.config.as_deref());
    let config_provider = if path.exists() {
        Toml::file(&path)
    } else {
        Toml::string("")
    };

    let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(config_provider)
        .merge(
            Env::prefixed("NEWRELIC_").only(&["api_key", "account_id", "region", "timezone"]),
        )
        .merge(Serialized::defaults(ConfigOverrides::from_cli(cli)))
        .extract()
        .context("failed to load configuration")?;

    config.normalize();
    config.validate()?;

    Ok(config)
}

/// Loads without validation, for `config set-*`: a partially configured file
/// must still be editable.
pub fn load_for_editing(cli: &Cli) -> Result<Config> {
    let path = config_file_path(cli.config.as_deref());
    let config_provider = if path.exists() {
        Toml::file(&path)
    } else {
        Toml::string("")
    };

    let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(config_provider)
        .extract()
        .context("failed to load configuration")?;

    config.normalize();
    Ok(config)
}

#[derive(Debug, Clone, Serialize, Default)]
struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<String>,
}

impl ConfigOverrides {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            api_key: normalized(cli.api_key.clone()),
            account_id: normalized(cli.account_id.clone()),
            region: normalized(cli.region.clone()),
            timezone: normalized(cli.timezone.clone()),
            timeout: normalized(cli.timeout.clone()),
            log_level: normalized(cli.log_level.clone()),
        }
    }
}

fn normalized(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim().to_string();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    })
}

fn ensure_non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{key} must not be empty");
    }

    Ok(())
}
