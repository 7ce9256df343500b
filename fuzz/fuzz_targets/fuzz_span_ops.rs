//! Fuzz target for span slot bookkeeping.
//!
//! Arbitrary interleavings of start/end with arbitrary indices must never
//! panic, and the slot count must stay within bounds.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wakebuf::telemetry::{MAX_ACTIVE_SPANS, SPAN_CAPACITY};
use wakebuf::Telemetry;

#[derive(Debug, Arbitrary)]
enum Op {
    Start(Vec<u8>),
    End { index: i32, success: bool },
    Snapshot { acknowledge: bool },
    Toggle,
}

fuzz_target!(|ops: Vec<Op>| {
    let telemetry = Telemetry::new();
    for op in ops {
        match op {
            Op::Start(name) => {
                let _ = telemetry.start_span(name);
            }
            Op::End { index, success } => telemetry.end_span(index, success),
            Op::Snapshot { acknowledge } => {
                let snapshot = telemetry.snapshot();
                if acknowledge {
                    telemetry.acknowledge(&snapshot);
                }
            }
            Op::Toggle => {
                if telemetry.is_enabled() {
                    telemetry.disable();
                } else {
                    telemetry.enable();
                }
            }
        }
        assert!(telemetry.active_spans() <= MAX_ACTIVE_SPANS);
        assert!(telemetry.span_queue().len() <= SPAN_CAPACITY);
    }
});
