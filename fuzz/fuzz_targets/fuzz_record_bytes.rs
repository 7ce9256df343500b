//! Fuzz target for recording arbitrary bytes.
//!
//! Any byte sequence, valid UTF-8 or not, must be accepted as a log body,
//! metric name, or span name and still encode to OTLP JSON.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wakebuf::export::{otlp, ResourceInfo};
use wakebuf::telemetry::{MAX_BODY_LEN, MAX_METRIC_NAME_LEN};
use wakebuf::{Severity, Telemetry};

fuzz_target!(|data: &[u8]| {
    let telemetry = Telemetry::new();
    let severity = data
        .first()
        .and_then(|b| Severity::from_number(*b))
        .unwrap_or_default();

    telemetry.log(severity, data);
    telemetry.record_gauge(data, data.len() as i64);
    telemetry.record_counter(data, -(data.len() as i64));
    let idx = telemetry.start_span(data);
    telemetry.end_span(idx, data.len() % 2 == 0);

    let snapshot = telemetry.snapshot();
    assert!(snapshot.logs[0].body_len() <= MAX_BODY_LEN);
    assert!(snapshot.metrics[0].name_len() <= MAX_METRIC_NAME_LEN);
    assert!(otlp::encode(&ResourceInfo::default(), &snapshot).is_ok());
});
