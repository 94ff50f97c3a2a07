//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Downloads (starts, outcomes, bytes, duration, provider confirmations)
//! - Transcoding (results, duration)
//! - Delivery (mode and result)
//! - Pipeline runs (final stage)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Downloads
// =============================================================================

/// Downloads started total.
pub static DOWNLOADS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("uplink_downloads_started_total", "Total downloads started").unwrap()
});

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "uplink_downloads_completed_total",
        "Total downloads completed successfully",
    )
    .unwrap()
});

/// Downloads failed total.
pub static DOWNLOADS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("uplink_downloads_failed_total", "Total downloads that failed").unwrap()
});

/// Bytes written to disk by completed downloads.
pub static DOWNLOADED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "uplink_downloaded_bytes_total",
        "Total bytes written by completed downloads",
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("uplink_download_duration_seconds", "Duration of downloads")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"], // "success"
    )
    .unwrap()
});

/// Provider large-file confirmations performed.
pub static HANDSHAKE_CONFIRMATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "uplink_handshake_confirmations_total",
        "Two-phase downloads that needed a confirmation token",
    )
    .unwrap()
});

// =============================================================================
// Transcoding
// =============================================================================

/// Transcodes total by result.
pub static TRANSCODES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("uplink_transcodes_total", "Total transcode attempts"),
        &["result"], // "success", "failed", "cancelled"
    )
    .unwrap()
});

/// Transcode duration in seconds.
pub static TRANSCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("uplink_transcode_duration_seconds", "Duration of transcodes")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Delivery and pipeline
// =============================================================================

/// Deliveries total by mode and result.
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("uplink_deliveries_total", "Total delivery attempts"),
        &["mode", "result"], // mode: "video", "document"; result: "success", "failed"
    )
    .unwrap()
});

/// Pipeline runs total by final stage.
pub static PIPELINE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("uplink_pipeline_runs_total", "Total pipeline runs"),
        &["final_stage"], // "done", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Downloads
        Box::new(DOWNLOADS_STARTED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(DOWNLOADED_BYTES.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(HANDSHAKE_CONFIRMATIONS.clone()),
        // Transcoding
        Box::new(TRANSCODES_TOTAL.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
        // Delivery and pipeline
        Box::new(DELIVERIES_TOTAL.clone()),
        Box::new(PIPELINE_RUNS.clone()),
    ]
}
