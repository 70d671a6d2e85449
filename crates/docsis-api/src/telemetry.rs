// Telemetry read batch
//
// The nine `getValue` actions issued every scrape, and the typed decode of
// their callbacks. Each field is looked up by the action id it was
// requested under rather than by raw array position.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::protocol::{Action, Reply, de_f64, de_i64, de_string, de_u64};

/// Actions of the telemetry batch, in request order. The discriminant is
/// the action id sent to the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TelemetryAction {
    BuildDate = 0,
    MemoryStatus = 1,
    Manufacturer = 2,
    ModelName = 3,
    ProcessStatus = 4,
    SoftwareVersion = 5,
    UpTime = 6,
    Downstreams = 7,
    Upstreams = 8,
}

impl TelemetryAction {
    pub const ALL: [Self; 9] = [
        Self::BuildDate,
        Self::MemoryStatus,
        Self::Manufacturer,
        Self::ModelName,
        Self::ProcessStatus,
        Self::SoftwareVersion,
        Self::UpTime,
        Self::Downstreams,
        Self::Upstreams,
    ];

    #[allow(clippy::as_conversions)]
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn xpath(self) -> &'static str {
        match self {
            Self::BuildDate => "Device/DeviceInfo/BuildDate",
            Self::MemoryStatus => "Device/DeviceInfo/MemoryStatus",
            Self::Manufacturer => "Device/DeviceInfo/Manufacturer",
            Self::ModelName => "Device/DeviceInfo/ModelName",
            Self::ProcessStatus => "Device/DeviceInfo/ProcessStatus",
            Self::SoftwareVersion => "Device/DeviceInfo/SoftwareVersion",
            Self::UpTime => "Device/DeviceInfo/UpTime",
            Self::Downstreams => "Device/Docsis/CableModem/Downstreams",
            Self::Upstreams => "Device/Docsis/CableModem/Upstreams",
        }
    }
}

/// Build the full telemetry request batch.
pub fn telemetry_actions() -> Vec<Action> {
    TelemetryAction::ALL
        .iter()
        .map(|a| Action::get_value(a.id(), a.xpath()))
        .collect()
}

// ── Decoded values ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryStatus {
    #[serde(deserialize_with = "de_u64")]
    pub total: u64,
    #[serde(deserialize_with = "de_u64")]
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadAverage {
    #[serde(rename = "Load1", deserialize_with = "de_f64")]
    pub load1: f64,
    #[serde(rename = "Load5", deserialize_with = "de_f64")]
    pub load5: f64,
    #[serde(rename = "Load15", deserialize_with = "de_f64")]
    pub load15: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessStatus {
    #[serde(rename = "CPUUsage", deserialize_with = "de_f64")]
    pub cpu_usage: f64,
    #[serde(rename = "LoadAverage")]
    pub load_average: LoadAverage,
}

/// One entry of `Device/Docsis/CableModem/Downstreams`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDownstream {
    #[serde(rename = "ChannelID", deserialize_with = "de_i64")]
    pub channel_id: i64,
    #[serde(rename = "Frequency", deserialize_with = "de_i64")]
    pub frequency: i64,
    #[serde(rename = "Modulation", deserialize_with = "de_string")]
    pub modulation: String,
    #[serde(rename = "SymbolRate", deserialize_with = "de_i64")]
    pub symbol_rate: i64,
    #[serde(rename = "BandWidth", deserialize_with = "de_i64")]
    pub bandwidth: i64,
    #[serde(rename = "PowerLevel", deserialize_with = "de_f64")]
    pub power_level: f64,
    #[serde(rename = "SNR", deserialize_with = "de_f64")]
    pub snr: f64,
    #[serde(rename = "UnerroredCodewords", deserialize_with = "de_u64")]
    pub unerrored_codewords: u64,
    #[serde(rename = "CorrectableCodewords", deserialize_with = "de_u64")]
    pub correctable_codewords: u64,
    #[serde(rename = "UncorrectableCodewords", deserialize_with = "de_u64")]
    pub uncorrectable_codewords: u64,
}

/// One entry of `Device/Docsis/CableModem/Upstreams`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawUpstream {
    #[serde(rename = "ChannelID", deserialize_with = "de_i64")]
    pub channel_id: i64,
    #[serde(rename = "Frequency", deserialize_with = "de_i64")]
    pub frequency: i64,
    #[serde(rename = "Modulation", deserialize_with = "de_string")]
    pub modulation: String,
    #[serde(rename = "SymbolRate", deserialize_with = "de_i64")]
    pub symbol_rate: i64,
    #[serde(rename = "PowerLevel", deserialize_with = "de_f64")]
    pub power_level: f64,
}

/// Typed contents of one successful telemetry reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReply {
    pub build_date: String,
    pub memory: MemoryStatus,
    pub manufacturer: String,
    pub model_name: String,
    pub process: ProcessStatus,
    pub software_version: String,
    pub uptime: u64,
    /// Channels in the order the modem listed them.
    pub downstreams: Vec<RawDownstream>,
    pub upstreams: Vec<RawUpstream>,
}

#[derive(Deserialize)]
struct MemoryWrapper {
    #[serde(rename = "MemoryStatus")]
    inner: MemoryStatus,
}

#[derive(Deserialize)]
struct ProcessWrapper {
    #[serde(rename = "ProcessStatus")]
    inner: ProcessStatus,
}

impl TelemetryReply {
    /// Decode an error-free reply. The caller has already checked the
    /// top-level error descriptor.
    pub(crate) fn decode(reply: &Reply) -> Result<Self, Error> {
        let memory: MemoryWrapper = value_of(reply, TelemetryAction::MemoryStatus)?;
        let process: ProcessWrapper = value_of(reply, TelemetryAction::ProcessStatus)?;
        let uptime: UpTime = value_of(reply, TelemetryAction::UpTime)?;

        Ok(Self {
            build_date: text_of(reply, TelemetryAction::BuildDate)?,
            memory: memory.inner,
            manufacturer: text_of(reply, TelemetryAction::Manufacturer)?,
            model_name: text_of(reply, TelemetryAction::ModelName)?,
            process: process.inner,
            software_version: text_of(reply, TelemetryAction::SoftwareVersion)?,
            uptime: uptime.0,
            downstreams: value_of(reply, TelemetryAction::Downstreams)?,
            upstreams: value_of(reply, TelemetryAction::Upstreams)?,
        })
    }
}

#[derive(Deserialize)]
struct UpTime(#[serde(deserialize_with = "de_u64")] u64);

fn raw_value(reply: &Reply, action: TelemetryAction) -> Result<&Value, Error> {
    reply
        .action(action.id())
        .and_then(|a| a.parameters())
        .and_then(|p| p.get("value"))
        .ok_or(Error::MissingAction { id: action.id() })
}

fn value_of<T: DeserializeOwned>(reply: &Reply, action: TelemetryAction) -> Result<T, Error> {
    let raw = raw_value(reply, action)?;
    T::deserialize(raw).map_err(|e| Error::Deserialization {
        message: format!("{}: {e}", action.xpath()),
        body: raw.to_string(),
    })
}

fn text_of(reply: &Reply, action: TelemetryAction) -> Result<String, Error> {
    let StringLike(text) = value_of(reply, action)?;
    Ok(text)
}

#[derive(Deserialize)]
struct StringLike(#[serde(deserialize_with = "de_string")] String);
