//! wakebuf
//!
//! Bounded, in-memory telemetry buffering for devices that sleep most of the
//! time and only reach the network occasionally. Producers record logs,
//! metric points, and spans into fixed-capacity rings; an exporter drains them
//! when a link is available.
//!
//! # Guarantees
//!
//! - **Bounded**: every buffer is a fixed array. Full rings overwrite their
//!   oldest entry; a full span table drops new spans.
//! - **Fixed width**: log bodies are cut at 64 bytes, metric and span names at
//!   32 bytes.
//! - **Infallible recording**: recording calls never return errors and never
//!   panic, whatever the input. Loss is counted in [`telemetry::DropStats`].
//! - **No I/O**: transport belongs to an [`export::Exporter`].
//!
//! # Example
//!
//! ```
//! use wakebuf::Telemetry;
//!
//! let telemetry = Telemetry::new();
//! telemetry.set_trace_context([1; 16], [2; 8]);
//!
//! let wake = telemetry.start_span("wake");
//! telemetry.record_gauge("battery.mv", 3712);
//! telemetry.log_info("schedule fetched");
//! telemetry.end_span(wake, true);
//!
//! assert_eq!(telemetry.log_queue().len(), 1);
//! assert_eq!(telemetry.span_queue()[0].name, "wake");
//! ```

pub mod buffer;
pub mod cli;
pub mod clock;
pub mod config;
pub mod export;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TelemetryConfig;
pub use telemetry::{Severity, SpanIndex, Telemetry, TelemetrySnapshot};
