//! Bounded storage primitives.
//!
//! Everything the telemetry buffers hold lives in fixed arrays sized at
//! compile time. Nothing here grows after construction.

mod fixed;
mod ring;

pub use fixed::FixedBytes;
pub use ring::RingBuffer;
