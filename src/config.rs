//! Configuration loading from an optional TOML file and environment variables.
//!
//! Values come from `WAKEBUF_*` environment variables, layered over an
//! optional TOML file named by `WAKEBUF_CONFIG`. Invalid values fall back to
//! defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `WAKEBUF_CONFIG` | unset | Path to a TOML config file |
//! | `WAKEBUF_ENABLED` | true | Initial state of the recording gate |
//! | `WAKEBUF_SERVICE_NAME` | wakebuf | OTLP `service.name` |
//! | `WAKEBUF_CLIENT_ID` | unset | Device identity, OTLP `service.instance.id` |
//! | `WAKEBUF_COLLECTOR_ADDR` | unset | Collector `host:port`, e.g. `192.168.1.100:4318` |
//! | `WAKEBUF_LOG_LEVEL` | info | Diagnostic log filter |
//! | `WAKEBUF_LOG_FORMAT` | json | `json` or `pretty` |
//! | `WAKEBUF_LOG_FILE` | unset | Diagnostic log file (stderr if unset) |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::export::ResourceInfo;
use crate::telemetry::{LogConfig, LogFormat, Telemetry};

pub const DEFAULT_SERVICE_NAME: &str = "wakebuf";

/// Errors loading a config file. Environment variables never error; bad
/// values are ignored.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid collector address {0:?}, expected host:port")]
    InvalidCollectorAddr(String),
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub service_name: String,
    pub client_id: Option<String>,
    pub collector_addr: Option<SocketAddr>,
    pub log: LogConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            client_id: None,
            collector_addr: None,
            log: LogConfig::default(),
        }
    }
}

/// On-disk layout. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    enabled: Option<bool>,
    service_name: Option<String>,
    client_id: Option<String>,
    collector_addr: Option<String>,
    log: Option<LogConfig>,
}

/// Flat summary of effective values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub enabled: bool,
    pub service_name: String,
    pub client_id: String,
    pub collector_addr: String,
    pub log_level: String,
    pub log_format: &'static str,
    pub log_file: String,
}

impl TelemetryConfig {
    /// Parse TOML text over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(text)?;
        let mut cfg = Self::default();
        if let Some(enabled) = file.enabled {
            cfg.enabled = enabled;
        }
        if let Some(name) = non_empty(file.service_name) {
            cfg.service_name = name;
        }
        cfg.client_id = non_empty(file.client_id);
        if let Some(addr) = non_empty(file.collector_addr) {
            cfg.collector_addr = Some(parse_addr(&addr)?);
        }
        if let Some(log) = file.log {
            cfg.log = log;
        }
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `WAKEBUF_*` overrides in place.
    pub fn apply_env(&mut self) {
        if let Some(enabled) = env_var("WAKEBUF_ENABLED").and_then(|v| parse_bool(&v)) {
            self.enabled = enabled;
        }
        if let Some(name) = env_var("WAKEBUF_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Some(id) = env_var("WAKEBUF_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Some(addr) = env_var("WAKEBUF_COLLECTOR_ADDR") {
            match parse_addr(&addr) {
                Ok(addr) => self.collector_addr = Some(addr),
                Err(e) => tracing::warn!(error = %e, "ignoring WAKEBUF_COLLECTOR_ADDR"),
            }
        }
        if let Some(level) = env_var("WAKEBUF_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = env_var("WAKEBUF_LOG_FORMAT") {
            match format.parse::<LogFormat>() {
                Ok(format) => self.log.format = format,
                Err(e) => tracing::warn!(error = %e, "ignoring WAKEBUF_LOG_FORMAT"),
            }
        }
        if let Some(path) = env_var("WAKEBUF_LOG_FILE") {
            self.log.output_path = Some(PathBuf::from(path));
        }
    }

    /// OTLP resource identity for exporters.
    pub fn resource(&self) -> ResourceInfo {
        ResourceInfo {
            service_name: self.service_name.clone(),
            instance_id: self.client_id.clone(),
        }
    }

    /// Build a recorder with the configured initial gate state.
    pub fn build(&self) -> Telemetry {
        let telemetry = Telemetry::new();
        if !self.enabled {
            telemetry.disable();
        }
        telemetry
    }

    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            enabled: self.enabled,
            service_name: self.service_name.clone(),
            client_id: self.client_id.clone().unwrap_or_default(),
            collector_addr: self
                .collector_addr
                .map(|a| a.to_string())
                .unwrap_or_default(),
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str(),
            log_file: self
                .log
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::InvalidCollectorAddr(value.to_string()))
}

/// Load configuration: the `WAKEBUF_CONFIG` file if set and readable, then
/// environment overrides.
///
/// A missing or invalid file is logged and skipped; this never fails.
pub fn load() -> TelemetryConfig {
    let mut cfg = match env_var("WAKEBUF_CONFIG") {
        Some(path) => TelemetryConfig::from_file(Path::new(&path)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            TelemetryConfig::default()
        }),
        None => TelemetryConfig::default(),
    };
    cfg.apply_env();
    cfg
}
