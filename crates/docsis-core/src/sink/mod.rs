// ── Record sinks ──
//
// The ingest worker writes through the `Sink` trait; `ClickHouseSink` is
// the production implementation.

pub mod clickhouse;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::model::TelemetryRecord;

pub use clickhouse::ClickHouseSink;

/// Sink-specific instruction travelling alongside each queued record
/// (for ClickHouse, the `INSERT` statement).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertDirective(Arc<str>);

impl InsertDirective {
    pub fn new(statement: impl Into<Arc<str>>) -> Self {
        Self(statement.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InsertDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure to persist a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink rejected insert (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Destination for telemetry records.
pub trait Sink: Send + Sync + 'static {
    /// Directive the producer attaches to every queued record.
    fn insert_directive(&self) -> InsertDirective;

    /// Persist one record.
    fn write(
        &self,
        directive: &InsertDirective,
        record: &TelemetryRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

impl<S: Sink> Sink for Arc<S> {
    fn insert_directive(&self) -> InsertDirective {
        (**self).insert_directive()
    }

    fn write(
        &self,
        directive: &InsertDirective,
        record: &TelemetryRecord,
    ) -> impl Future<Output = Result<(), SinkError>> + Send {
        (**self).write(directive, record)
    }
}
