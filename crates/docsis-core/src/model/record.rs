use chrono::{DateTime, Utc};
use serde::Serialize;

/// One DOCSIS downstream channel, as reported by the modem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownstreamChannel {
    pub id: i64,
    /// Centre frequency in Hz.
    pub frequency: i64,
    pub modulation: String,
    pub symbol_rate: i64,
    pub bandwidth: i64,
    /// Receive power in dBmV.
    pub power_level: f64,
    /// Signal-to-noise ratio in dB.
    pub snr: f64,
    pub unerrored_codewords: u64,
    pub correctable_codewords: u64,
    pub uncorrectable_codewords: u64,
}

/// One DOCSIS upstream channel, as reported by the modem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamChannel {
    pub id: i64,
    pub frequency: i64,
    pub modulation: String,
    pub symbol_rate: i64,
    /// Transmit power in dBmV.
    pub power_level: f64,
}

/// Snapshot of one successful scrape cycle.
///
/// Only ever built from a reply the modem marked error-free. Channel
/// vectors keep the modem's ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub modem_name: String,
    /// Seconds since the modem booted.
    pub uptime: u64,
    /// `"{software version} {build date}"`.
    pub version: String,
    /// `"{manufacturer} {model name}"`.
    pub model: String,
    pub cpu_usage: f64,
    pub load_average_1: f64,
    pub load_average_5: f64,
    pub load_average_15: f64,
    pub total_memory: u64,
    pub free_memory: u64,
    pub downstream_channels: Vec<DownstreamChannel>,
    pub upstream_channels: Vec<UpstreamChannel>,
    /// Request round trip in seconds.
    pub scrape_latency: f64,
    pub captured_at: DateTime<Utc>,
}

impl TelemetryRecord {
    /// Capture time as fractional UTC epoch seconds.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn timestamp_secs(&self) -> f64 {
        self.captured_at.timestamp_micros() as f64 / 1_000_000.0
    }
}
