//! Service Configuration
//!
//! Built once at process start and passed down explicitly. Layers, lowest
//! first:
//!
//! 1. Built-in defaults
//! 2. YAML file (`version: 1` schema, unknown keys rejected)
//! 3. `CATALOG_<FIELD>` environment variables
//!
//! ```yaml
//! version: 1
//! environment: production
//! database_url: sqlite:///var/lib/catalog/metadata.db
//! max_page_size: 500
//! ```

pub mod error;
pub mod io;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use io::ConfigFileV1;
pub use validation::{Validatable, LOG_LEVELS};

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "CATALOG_";

const SUPPORTED_VERSIONS: [u32; 1] = [1];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub app_name: String,
    pub environment: String,
    pub log_level: String,
    /// Mount point of every API route, e.g. `/api/v1`
    pub api_prefix: String,
    pub bind_addr: String,
    /// `sqlite://<path>`, `sqlite://:memory:` or `memory://`
    pub database_url: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            app_name: "Metadata Service".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            api_prefix: "/api/v1".to_string(),
            bind_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://metadata.db".to_string(),
            default_page_size: 50,
            max_page_size: 200,
        }
    }
}

/// Where the catalog keeps its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    SqliteFile(PathBuf),
    SqliteInMemory,
    Memory,
}

impl CatalogConfig {
    /// Defaults, then the optional YAML file, then the process environment
    ///
    /// The result is validated.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)?;
            config.apply_yaml(&content)?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Layer a v1 YAML document over the current values
    pub fn apply_yaml(&mut self, content: &str) -> ConfigResult<()> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        match file.version {
            None => return Err(ConfigError::MissingVersion),
            Some(found) if !SUPPORTED_VERSIONS.contains(&found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }

        let ConfigFileV1 {
            version: _,
            app_name,
            environment,
            log_level,
            api_prefix,
            bind_addr,
            database_url,
            default_page_size,
            max_page_size,
        } = file;

        overlay(&mut self.app_name, app_name);
        overlay(&mut self.environment, environment);
        overlay(&mut self.log_level, log_level);
        overlay(&mut self.api_prefix, api_prefix);
        overlay(&mut self.bind_addr, bind_addr);
        overlay(&mut self.database_url, database_url);
        overlay(&mut self.default_page_size, default_page_size);
        overlay(&mut self.max_page_size, max_page_size);
        Ok(())
    }

    /// Layer `CATALOG_<FIELD>` overrides; `lookup` resolves a variable name
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |field: &str| lookup(&format!("{}{}", ENV_PREFIX, field.to_uppercase()));

        overlay(&mut self.app_name, var("app_name"));
        overlay(&mut self.environment, var("environment"));
        overlay(&mut self.log_level, var("log_level"));
        overlay(&mut self.api_prefix, var("api_prefix"));
        overlay(&mut self.bind_addr, var("bind_addr"));
        overlay(&mut self.database_url, var("database_url"));
        overlay(
            &mut self.default_page_size,
            parse_env("default_page_size", var("default_page_size"))?,
        );
        overlay(
            &mut self.max_page_size,
            parse_env("max_page_size", var("max_page_size"))?,
        );
        Ok(())
    }

    /// Export the effective configuration as a v1 YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            app_name: Some(self.app_name.clone()),
            environment: Some(self.environment.clone()),
            log_level: Some(self.log_level.clone()),
            api_prefix: Some(self.api_prefix.clone()),
            bind_addr: Some(self.bind_addr.clone()),
            database_url: Some(self.database_url.clone()),
            default_page_size: Some(self.default_page_size),
            max_page_size: Some(self.max_page_size),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    /// Parse `database_url` into a store selection
    pub fn database_target(&self) -> ConfigResult<DatabaseTarget> {
        let url = self.database_url.trim();
        if url == "memory://" {
            return Ok(DatabaseTarget::Memory);
        }
        match url.strip_prefix("sqlite://") {
            Some(":memory:") => Ok(DatabaseTarget::SqliteInMemory),
            Some(path) if !path.is_empty() => Ok(DatabaseTarget::SqliteFile(PathBuf::from(path))),
            Some(_) => Err(ConfigError::invalid(
                "database_url",
                "sqlite URL needs a file path, e.g. 'sqlite://metadata.db'",
            )),
            None => Err(ConfigError::invalid(
                "database_url",
                format!(
                    "unsupported scheme in '{}'. Use 'sqlite://<path>' or 'memory://'",
                    url
                ),
            )),
        }
    }
}

fn overlay<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn parse_env<T: FromStr>(field: &str, raw: Option<String>) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    raw.map(|raw| {
        raw.trim().parse::<T>().map_err(|e| {
            ConfigError::invalid(
                field,
                format!("{}{}='{}': {}", ENV_PREFIX, field.to_uppercase(), raw, e),
            )
        })
    })
    .transpose()
}
