//! Prometheus registry for the uplink binary.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};

/// Registry holding every core metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in uplink_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

/// Encodes all metrics in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_core_metrics() {
        uplink_core::metrics::DOWNLOADS_STARTED.inc();
        let text = encode_metrics();
        assert!(text.contains("uplink_downloads_started_total"));
    }
}
