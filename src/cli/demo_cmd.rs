// Copyright 2024-2026 wakebuf Contributors
// SPDX-License-Identifier: Apache-2.0

//! `demo`: record one simulated wake cycle and print what an exporter sees.

use crate::clock::Clock;
use crate::export::{otlp, ExportError, ResourceInfo};
use crate::telemetry::Telemetry;

/// Output shape for the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoOutput {
    Snapshot,
    Otlp,
}

/// Record a representative wake cycle: a wake span wrapping a failed broker
/// connect and a successful schedule refresh, with logs and metrics in between.
pub fn simulate_wake_cycle<K: Clock>(telemetry: &Telemetry<K>) {
    let wake = telemetry.start_span("wake");
    telemetry.log_info("woke from deep sleep");
    telemetry.record_counter("wakes.total", 1);
    telemetry.record_gauge("battery.mv", 3712);

    let connect = telemetry.start_span("broker.connect");
    telemetry.log_warn("broker unreachable, will retry next wake");
    telemetry.end_span(connect, false);

    let refresh = telemetry.start_span("schedule.refresh");
    telemetry.record_gauge("schedule.entries", 12);
    telemetry.log_debug("schedule unchanged");
    telemetry.end_span(refresh, true);

    telemetry.record_gauge("led.state", 1);
    telemetry.end_span(wake, true);
}

/// Run the demo against a fresh buffer and render the result.
pub fn render_demo<K: Clock>(
    telemetry: &Telemetry<K>,
    resource: &ResourceInfo,
    output: DemoOutput,
) -> Result<String, ExportError> {
    simulate_wake_cycle(telemetry);
    let snapshot = telemetry.snapshot();
    match output {
        DemoOutput::Snapshot => Ok(serde_json::to_string_pretty(&snapshot)?),
        DemoOutput::Otlp => {
            let batch = otlp::encode(resource, &snapshot)?;
            let mut out = String::new();
            for (path, body) in batch.requests() {
                out.push_str(&format!("POST {}\n{}\n", path, String::from_utf8_lossy(body)));
            }
            Ok(out)
        }
    }
}

/// Entry point for `wakebuf-cli demo`. Returns a process exit code.
pub fn run_demo(telemetry: &Telemetry, resource: &ResourceInfo, output: DemoOutput) -> i32 {
    match render_demo(telemetry, resource, output) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("demo failed: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_wake_cycle_contents() {
        let t = Telemetry::with_clock(ManualClock::new(1));
        simulate_wake_cycle(&t);

        assert_eq!(t.log_queue().len(), 3);
        assert_eq!(t.metric_queue().len(), 4);
        let spans = t.span_queue();
        let names: Vec<String> = spans.iter().map(|s| s.name.to_string_lossy()).collect();
        assert_eq!(names, vec!["broker.connect", "schedule.refresh", "wake"]);
        assert!(!spans[0].status_ok);
        assert_eq!(t.active_spans(), 0);
    }

    #[test]
    fn test_render_snapshot_is_json() {
        let t = Telemetry::with_clock(ManualClock::new(1));
        let text = render_demo(&t, &ResourceInfo::default(), DemoOutput::Snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["logs"].as_array().unwrap().len(), 3);
        assert_eq!(value["stats"]["spans_dropped"], 0);
    }

    #[test]
    fn test_render_otlp_has_all_paths() {
        let t = Telemetry::with_clock(ManualClock::new(1));
        let text = render_demo(&t, &ResourceInfo::default(), DemoOutput::Otlp).unwrap();
        assert!(text.contains("POST /v1/logs"));
        assert!(text.contains("POST /v1/metrics"));
        assert!(text.contains("POST /v1/traces"));
    }

    #[test]
    fn test_render_otlp_without_context_has_valid_ids() {
        let text = render_demo(&Telemetry::new(), &ResourceInfo::default(), DemoOutput::Otlp).unwrap();
        assert!(!text.contains(&format!("\"traceId\":\"{}\"", "0".repeat(32))));
        assert!(!text.contains(&format!("\"spanId\":\"{}\"", "0".repeat(16))));
        assert_eq!(text.matches("\"traceId\"").count(), 3);
    }
}
