//! Current trace context, stamped onto logs and spans at creation.

use serde::Serialize;

/// 16-byte W3C/OTLP trace identifier.
pub type TraceId = [u8; 16];
/// 8-byte W3C/OTLP span identifier.
pub type SpanId = [u8; 8];

/// Trace and span identifiers supplied by the host.
///
/// All-zero identifiers are legal. Whether entries carry a trace is decided by
/// `active`, not by the byte values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraceContext {
    #[serde(with = "hex_bytes")]
    pub trace_id: TraceId,
    #[serde(with = "hex_bytes")]
    pub span_id: SpanId,
    pub active: bool,
}

impl TraceContext {
    pub fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            trace_id,
            span_id,
            active: true,
        }
    }
}

/// OTLP treats an all-zero trace or span id as absent.
pub(crate) fn is_zero_id(id: &[u8]) -> bool {
    id.iter().all(|b| *b == 0)
}

pub(crate) fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Serialize fixed byte arrays as lowercase hex.
pub(crate) mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zero_id() {
        assert!(is_zero_id(&[0; 16]));
        assert!(!is_zero_id(&[0, 0, 0, 0, 0, 0, 0, 1]));
    }

    #[test]
    fn test_default_is_inactive_zero() {
        let ctx = TraceContext::default();
        assert!(!ctx.active);
        assert_eq!(ctx.trace_id, [0; 16]);
        assert_eq!(ctx.span_id, [0; 8]);
    }

    #[test]
    fn test_zero_ids_can_be_active() {
        let ctx = TraceContext::new([0; 16], [0; 8]);
        assert!(ctx.active);
    }

    #[test]
    fn test_serializes_ids_as_hex() {
        let mut trace_id = [0u8; 16];
        trace_id[15] = 0xab;
        let ctx = TraceContext::new(trace_id, [1, 2, 3, 4, 5, 6, 7, 8]);
        let json = serde_json::to_value(ctx).unwrap();
        assert_eq!(json["trace_id"], "000000000000000000000000000000ab");
        assert_eq!(json["span_id"], "0102030405060708");
        assert_eq!(json["active"], true);
    }
}
