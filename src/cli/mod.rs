// Copyright 2024-2026 wakebuf Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for wakebuf commands.
//!
//! The buffer is a library; the binary exists to inspect configuration and
//! to show what an exporter would receive after a wake cycle.
//!
//! ## Usage
//!
//! ```bash
//! wakebuf-cli demo            # Simulate a wake cycle, print the snapshot as JSON
//! wakebuf-cli demo --otlp     # Same, printed as OTLP/HTTP JSON bodies
//! wakebuf-cli config show     # Effective configuration
//! ```

pub mod config_cmd;
pub mod demo_cmd;

pub use demo_cmd::{run_demo, simulate_wake_cycle, DemoOutput};

/// Top-level usage text.
pub fn usage() -> String {
    format!(
        "wakebuf {}\n\
         \n\
         USAGE:\n    \
         wakebuf-cli <COMMAND>\n\
         \n\
         COMMANDS:\n    \
         demo [--otlp]                  Simulate a wake cycle and print buffered telemetry\n    \
         config show|defaults|validate  Inspect configuration\n    \
         version                        Print version\n    \
         help [COMMAND]                 Print help",
        env!("CARGO_PKG_VERSION")
    )
}

/// Help for one command, or `None` if the command is unknown.
pub fn command_help(command: &str) -> Option<&'static str> {
    match command {
        "demo" => Some(
            "wakebuf-cli demo [--otlp]\n\n\
             Records a simulated wake cycle (spans, logs, gauges, counters) into a\n\
             fresh buffer and prints what an exporter would drain. With --otlp the\n\
             output is the OTLP/HTTP JSON body for each non-empty signal.",
        ),
        "config" => Some(
            "wakebuf-cli config <show|defaults|validate>\n\n\
             show      Effective values after file and environment overrides\n\
             defaults  Built-in defaults\n\
             validate  Warn about settings that leave exports unusable",
        ),
        _ => None,
    }
}
