// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, TextEncoder, exponential_buckets, register_counter,
    register_gauge, register_histogram,
};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of WebSocket connections currently registered.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("uniclip_connected_clients", "Number of currently connected clients.").unwrap();
    /// The number of bound pairs.
    pub static ref ACTIVE_ROOMS: Gauge =
        register_gauge!("uniclip_active_rooms", "Number of rooms with two bound peers.").unwrap();
    /// The number of issued codes that have not been redeemed or released.
    pub static ref OUTSTANDING_CODES: Gauge =
        register_gauge!("uniclip_outstanding_codes", "Number of pairing codes waiting to be redeemed.").unwrap();


    // --- Server-wide Counters ---
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("uniclip_connections_received_total", "Total number of connections received.").unwrap();
    pub static ref CODES_ISSUED_TOTAL: Counter =
        register_counter!("uniclip_codes_issued_total", "Total number of pairing codes issued.").unwrap();
    pub static ref PAIRINGS_TOTAL: Counter =
        register_counter!("uniclip_pairings_total", "Total number of successful JOINs.").unwrap();
    pub static ref FAILED_JOINS_TOTAL: Counter =
        register_counter!("uniclip_failed_joins_total", "Total number of JOINs answered with an error.").unwrap();
    pub static ref PAYLOADS_RELAYED_TOTAL: Counter =
        register_counter!("uniclip_payloads_relayed_total", "Total number of payloads forwarded to a partner.").unwrap();
    pub static ref PAYLOADS_DROPPED_TOTAL: Counter =
        register_counter!("uniclip_payloads_dropped_total", "Total number of payloads dropped (no partner or full queue).").unwrap();
    pub static ref CODES_EXPIRED_TOTAL: Counter =
        register_counter!("uniclip_codes_expired_total", "Total number of pairing codes removed by the TTL sweeper.").unwrap();


    // --- Histograms ---
    /// Sizes of relayed payloads in bytes.
    pub static ref PAYLOAD_SIZE_BYTES: Histogram =
        register_histogram!(
            "uniclip_payload_size_bytes",
            "Size of relayed payloads in bytes.",
            exponential_buckets(64.0, 4.0, 8).unwrap()
        ).unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# failed to encode metrics: {e}\n"))
}
