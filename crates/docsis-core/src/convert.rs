// ── Wire → domain conversion ──
//
// Maps the typed modem reply from `docsis-api` onto `TelemetryRecord`.
// Composite strings (version, model) are built here so sinks get one
// column per concept.

use chrono::{DateTime, Utc};

use docsis_api::{RawDownstream, RawUpstream, TelemetryScrape};

use crate::model::{DownstreamChannel, TelemetryRecord, UpstreamChannel};

impl From<RawDownstream> for DownstreamChannel {
    fn from(raw: RawDownstream) -> Self {
        Self {
            id: raw.channel_id,
            frequency: raw.frequency,
            modulation: raw.modulation,
            symbol_rate: raw.symbol_rate,
            bandwidth: raw.bandwidth,
            power_level: raw.power_level,
            snr: raw.snr,
            unerrored_codewords: raw.unerrored_codewords,
            correctable_codewords: raw.correctable_codewords,
            uncorrectable_codewords: raw.uncorrectable_codewords,
        }
    }
}

impl From<RawUpstream> for UpstreamChannel {
    fn from(raw: RawUpstream) -> Self {
        Self {
            id: raw.channel_id,
            frequency: raw.frequency,
            modulation: raw.modulation,
            symbol_rate: raw.symbol_rate,
            power_level: raw.power_level,
        }
    }
}

/// Build a record from one scrape, stamped with `captured_at`.
pub fn telemetry_record(
    modem_name: &str,
    scrape: TelemetryScrape,
    captured_at: DateTime<Utc>,
) -> TelemetryRecord {
    let TelemetryScrape { reply, latency } = scrape;
    let load = reply.process.load_average;

    TelemetryRecord {
        modem_name: modem_name.to_owned(),
        uptime: reply.uptime,
        version: format!("{} {}", reply.software_version, reply.build_date),
        model: format!("{} {}", reply.manufacturer, reply.model_name),
        cpu_usage: reply.process.cpu_usage,
        load_average_1: load.load1,
        load_average_5: load.load5,
        load_average_15: load.load15,
        total_memory: reply.memory.total,
        free_memory: reply.memory.free,
        downstream_channels: reply.downstreams.into_iter().map(Into::into).collect(),
        upstream_channels: reply.upstreams.into_iter().map(Into::into).collect(),
        scrape_latency: latency.as_secs_f64(),
        captured_at,
    }
}
