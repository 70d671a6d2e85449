// ── Ingest worker ──
//
// Drains the queue into the sink. A failed write is logged, the worker
// backs off for the retry delay, and the record is dropped.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::queue::QueueConsumer;
use crate::sink::Sink;

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub written: u64,
    pub dropped: u64,
}

/// Write queued records until cancelled or the queue closes.
pub async fn ingest_task<S: Sink>(
    mut consumer: QueueConsumer,
    sink: S,
    retry_delay: Duration,
    cancel: CancellationToken,
) -> IngestStats {
    let mut stats = IngestStats::default();

    loop {
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            item = consumer.get() => match item {
                Some(item) => item,
                None => {
                    debug!("ingest queue closed");
                    break;
                }
            },
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = sink.write(&item.directive, &item.record) => result,
        };

        match result {
            Ok(()) => {
                stats.written += 1;
                debug!(uptime = item.record.uptime, "record written");
            }
            Err(e) => {
                stats.dropped += 1;
                error!(error = %e, "failed to write record, dropping it");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(retry_delay) => {}
                }
            }
        }
    }

    debug!(written = stats.written, dropped = stats.dropped, "ingest worker stopped");
    stats
}
