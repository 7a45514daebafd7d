//! Configuration validation

use super::error::{ConfigError, ConfigResult};
use super::CatalogConfig;

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;
}

/// Levels accepted for `log_level` (case-insensitive)
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Validatable for CatalogConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::invalid("app_name", "must not be empty"));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log_level",
                format!(
                    "unknown level '{}'. Valid levels: {}",
                    self.log_level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::invalid(
                "api_prefix",
                format!("'{}' must start with '/'", self.api_prefix),
            ));
        }
        if self.api_prefix.len() > 1 && self.api_prefix.ends_with('/') {
            return Err(ConfigError::invalid(
                "api_prefix",
                format!("'{}' must not end with '/'", self.api_prefix),
            ));
        }

        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| ConfigError::invalid("bind_addr", e.to_string()))?;

        self.database_target()?;

        if self.default_page_size == 0 {
            return Err(ConfigError::invalid("default_page_size", "must be at least 1"));
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::invalid("max_page_size", "must be at least 1"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::invalid(
                "default_page_size",
                format!(
                    "{} exceeds max_page_size {}",
                    self.default_page_size, self.max_page_size
                ),
            ));
        }

        Ok(())
    }
}
