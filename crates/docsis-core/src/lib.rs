// docsis-core: Scrape-and-ingest pipeline between docsis-api and a record sink.

pub mod config;
pub mod convert;
pub mod error;
pub mod exporter;
pub mod model;
pub mod queue;
pub mod scraper;
pub mod sink;
pub mod worker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClickHouseConfig, ExporterConfig, ModemConfig, TlsVerification};
pub use error::CoreError;
pub use exporter::Exporter;
pub use queue::{QueueClosed, QueueConsumer, QueueItem, QueueProducer, ingest_queue};
pub use scraper::{CycleOutcome, ScrapeExit, Scraper};
pub use sink::{ClickHouseSink, InsertDirective, Sink, SinkError};
pub use worker::{IngestStats, ingest_task};

pub use model::{DownstreamChannel, TelemetryRecord, UpstreamChannel};
