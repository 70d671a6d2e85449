// ── ClickHouse sink ──
//
// Inserts records through the ClickHouse HTTP interface, one
// `JSONEachRow` line per record. Channel columns are arrays of tuples,
// sent as JSON arrays in the modem's channel order.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{InsertDirective, Sink, SinkError};
use crate::config::ClickHouseConfig;
use crate::error::CoreError;
use crate::model::TelemetryRecord;

/// Column list of the telemetry table, in insert order.
pub const COLUMNS: [&str; 14] = [
    "modem_name",
    "uptime",
    "version",
    "model",
    "cpu_usage",
    "load_average_1",
    "load_average_5",
    "load_average_15",
    "total_memory",
    "free_memory",
    "downstream_channels",
    "upstream_channels",
    "scrape_latency",
    "timestamp",
];

type DownstreamTuple<'a> = (i64, i64, &'a str, i64, i64, f64, f64, u64, u64, u64);
type UpstreamTuple<'a> = (i64, i64, &'a str, i64, f64);

#[derive(Serialize)]
struct Row<'a> {
    modem_name: &'a str,
    uptime: u64,
    version: &'a str,
    model: &'a str,
    cpu_usage: f64,
    load_average_1: f64,
    load_average_5: f64,
    load_average_15: f64,
    total_memory: u64,
    free_memory: u64,
    downstream_channels: Vec<DownstreamTuple<'a>>,
    upstream_channels: Vec<UpstreamTuple<'a>>,
    scrape_latency: f64,
    timestamp: f64,
}

impl<'a> From<&'a TelemetryRecord> for Row<'a> {
    fn from(r: &'a TelemetryRecord) -> Self {
        Self {
            modem_name: &r.modem_name,
            uptime: r.uptime,
            version: &r.version,
            model: &r.model,
            cpu_usage: r.cpu_usage,
            load_average_1: r.load_average_1,
            load_average_5: r.load_average_5,
            load_average_15: r.load_average_15,
            total_memory: r.total_memory,
            free_memory: r.free_memory,
            downstream_channels: r
                .downstream_channels
                .iter()
                .map(|c| {
                    (
                        c.id,
                        c.frequency,
                        c.modulation.as_str(),
                        c.symbol_rate,
                        c.bandwidth,
                        c.power_level,
                        c.snr,
                        c.unerrored_codewords,
                        c.correctable_codewords,
                        c.uncorrectable_codewords,
                    )
                })
                .collect(),
            upstream_channels: r
                .upstream_channels
                .iter()
                .map(|c| {
                    (
                        c.id,
                        c.frequency,
                        c.modulation.as_str(),
                        c.symbol_rate,
                        c.power_level,
                    )
                })
                .collect(),
            scrape_latency: r.scrape_latency,
            timestamp: r.timestamp_secs(),
        }
    }
}

/// Writes records to a ClickHouse table over HTTP.
pub struct ClickHouseSink {
    http: reqwest::Client,
    url: Url,
    username: String,
    password: SecretString,
    database: String,
    directive: InsertDirective,
}

impl ClickHouseSink {
    pub fn new(config: &ClickHouseConfig) -> Result<Self, CoreError> {
        let http = config.transport().build_client()?;
        Ok(Self::with_client(http, config))
    }

    /// Create a sink around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, config: &ClickHouseConfig) -> Self {
        let directive = InsertDirective::new(format!(
            "INSERT INTO {} ({}) FORMAT JSONEachRow",
            config.table,
            COLUMNS.join(", ")
        ));
        Self {
            http,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            directive,
        }
    }
}

impl Sink for ClickHouseSink {
    fn insert_directive(&self) -> InsertDirective {
        self.directive.clone()
    }

    async fn write(
        &self,
        directive: &InsertDirective,
        record: &TelemetryRecord,
    ) -> Result<(), SinkError> {
        let mut body = serde_json::to_vec(&Row::from(record))?;
        body.push(b'\n');

        debug!(database = %self.database, "inserting record into ClickHouse");

        let resp = self
            .http
            .post(self.url.clone())
            .query(&[("query", directive.as_str())])
            .header("X-ClickHouse-User", &self.username)
            .header("X-ClickHouse-Key", self.password.expose_secret())
            .header("X-ClickHouse-Database", &self.database)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{DownstreamChannel, UpstreamChannel};

    fn record() -> TelemetryRecord {
        TelemetryRecord {
            modem_name: "FAST3895".into(),
            uptime: 10,
            version: "v1 2023".into(),
            model: "Sagemcom FAST3895".into(),
            cpu_usage: 5.0,
            load_average_1: 0.1,
            load_average_5: 0.2,
            load_average_15: 0.3,
            total_memory: 100,
            free_memory: 50,
            downstream_channels: vec![DownstreamChannel {
                id: 4,
                frequency: 602_000_000,
                modulation: "QAM256".into(),
                symbol_rate: 5_360_537,
                bandwidth: 8_000_000,
                power_level: 3.5,
                snr: 38.0,
                unerrored_codewords: 1,
                correctable_codewords: 2,
                uncorrectable_codewords: 3,
            }],
            upstream_channels: vec![UpstreamChannel {
                id: 1,
                frequency: 36_000_000,
                modulation: "QAM64".into(),
                symbol_rate: 5120,
                power_level: 44.5,
            }],
            scrape_latency: 0.5,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn row_encodes_channels_as_tuples() {
        let record = record();
        let value = serde_json::to_value(Row::from(&record)).unwrap();
        assert_eq!(
            value["downstream_channels"],
            json!([[4, 602_000_000, "QAM256", 5_360_537, 8_000_000, 3.5, 38.0, 1, 2, 3]])
        );
        assert_eq!(
            value["upstream_channels"],
            json!([[1, 36_000_000, "QAM64", 5120, 44.5]])
        );
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for column in COLUMNS {
            assert!(keys.contains(&column), "missing column {column}");
        }
    }
}
