// ── Domain model ──
//
// Normalized telemetry as it leaves the scrape loop. Decoupled from the
// modem's wire names so sinks never see `ChannelID`-style keys.

pub mod record;

pub use record::{DownstreamChannel, TelemetryRecord, UpstreamChannel};
