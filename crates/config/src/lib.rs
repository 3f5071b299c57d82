use derive_more::derive::From;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, From)]
pub enum ConfigError {
    #[from(ignore)]
    IOError(std::io::Error),

    #[from(ignore)]
    DeserializationFailed(toml::de::Error),

    InvalidPath(std::path::PathBuf),

    #[from(ignore)]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::DeserializationFailed(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 1323;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Upper bound for `/range/{numbytes}` and the random byte endpoints.
pub const MAX_RANGE_BYTES: u64 = 100 << 10;

/// Upper bound for the drip body size, 10 MiB.
pub const MAX_DRIP_BYTES: u64 = 10 << 20;

/// Longest initial delay a drip or delay request may ask for.
pub const MAX_DELAY_SECS: f64 = 10.0;

/// Longest duration a timed stream may be spread over.
pub const MAX_STREAM_DURATION_SECS: f64 = 60.0;

/// Bounds applied to request parameters before any byte is written.
///
/// The defaults are the values clients observe; overriding them in a config file is
/// meant for local experiments only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_range_bytes: u64,
    pub max_drip_bytes: u64,
    pub max_delay_secs: f64,
    pub max_stream_duration_secs: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_range_bytes: MAX_RANGE_BYTES,
            max_drip_bytes: MAX_DRIP_BYTES,
            max_delay_secs: MAX_DELAY_SECS,
            max_stream_duration_secs: MAX_STREAM_DURATION_SECS,
        }
    }
}

/// `ServiceConfig` describes where the service listens, how loudly it logs and which
/// request limits it enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub addr: String,
    pub port: u16,
    pub log_level: String,
    pub limits: Limits,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: String::from(DEFAULT_ADDR),
            port: DEFAULT_PORT,
            log_level: String::from(DEFAULT_LOG_LEVEL),
            limits: Limits::default(),
        }
    }
}

impl ServiceConfig {
    /// Returns the `addr:port` pair the listener should bind to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Rejects limits that would make every request fail or that are not finite.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.addr.trim().is_empty() {
            return Err(ConfigError::InvalidValue(String::from("addr must not be empty")));
        }
        if self.limits.max_range_bytes == 0 {
            return Err(ConfigError::InvalidValue(String::from(
                "limits.max_range_bytes must be greater than zero",
            )));
        }
        if !self.limits.max_delay_secs.is_finite() || self.limits.max_delay_secs < 0.0 {
            return Err(ConfigError::InvalidValue(String::from(
                "limits.max_delay_secs must be a non-negative number",
            )));
        }
        if !self.limits.max_stream_duration_secs.is_finite()
            || self.limits.max_stream_duration_secs < 0.1
        {
            return Err(ConfigError::InvalidValue(String::from(
                "limits.max_stream_duration_secs must be at least 0.1",
            )));
        }
        Ok(())
    }
}

/// value_from_path returns the regular `toml::Value` object which implements the
/// `serde::DeserializeOwned` trait which allows you to directly manipulate the value object
/// instead of a defined type.
pub fn value_from_path<V: Into<std::path::PathBuf>>(target: V) -> ConfigResult<toml::Value> {
    from_path(target)
}

pub fn from_path<T, V>(target: V) -> ConfigResult<T>
where
    T: DeserializeOwned,
    V: Into<std::path::PathBuf>,
{
    let target_path = target.into();
    if !target_path.is_file() {
        return Err(ConfigError::InvalidPath(target_path));
    }
    let config_content = std::fs::read_to_string(target_path)?;
    let config_obj: T = toml::from_str(&config_content)?;
    Ok(config_obj)
}

/// Loads a [`ServiceConfig`] from a TOML file and validates it. Missing keys fall back
/// to their defaults.
pub fn service_config_from_path<V: Into<std::path::PathBuf>>(
    target: V,
) -> ConfigResult<ServiceConfig> {
    let config: ServiceConfig = from_path(target)?;
    config.validate()?;
    Ok(config)
}
