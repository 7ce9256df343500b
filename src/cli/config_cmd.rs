// Copyright 2024-2026 wakebuf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.

use crate::config::{self, EffectiveConfig, TelemetryConfig};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print!("{}", format_config(&cfg));
}

/// Print default config values (no file or env overrides) to stdout.
pub fn run_defaults() {
    let cfg = TelemetryConfig::default().effective_config();
    print!("{}", format_config(&cfg));
}

/// Validate configuration for settings that make exports unusable.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let warnings = validate(&config::load());
    for w in &warnings {
        eprintln!("WARNING: {}", w);
    }
    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

/// Warnings for a loaded config.
pub fn validate(cfg: &TelemetryConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if cfg.collector_addr.is_none() {
        warnings.push("WAKEBUF_COLLECTOR_ADDR is unset; exporters have no destination".to_string());
    }
    if cfg.client_id.is_none() {
        warnings.push("WAKEBUF_CLIENT_ID is unset; exports will not identify the device".to_string());
    }
    if !cfg.enabled {
        warnings.push("WAKEBUF_ENABLED is false; nothing will be recorded".to_string());
    }
    warnings
}

fn format_config(cfg: &EffectiveConfig) -> String {
    format!(
        "WAKEBUF_ENABLED={}\n\
         WAKEBUF_SERVICE_NAME={}\n\
         WAKEBUF_CLIENT_ID={}\n\
         WAKEBUF_COLLECTOR_ADDR={}\n\
         WAKEBUF_LOG_LEVEL={}\n\
         WAKEBUF_LOG_FORMAT={}\n\
         WAKEBUF_LOG_FILE={}\n",
        cfg.enabled,
        cfg.service_name,
        cfg.client_id,
        cfg.collector_addr,
        cfg.log_level,
        cfg.log_format,
        cfg.log_file,
    )
}
