// ── Bounded ingestion queue ──
//
// Fixed-capacity FIFO between the scrape loop and the ingest worker.
// A full queue suspends the producer instead of dropping records.

use tokio::sync::mpsc;

use crate::model::TelemetryRecord;
use crate::sink::InsertDirective;

/// A record paired with the sink directive that persists it.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub directive: InsertDirective,
    pub record: TelemetryRecord,
}

/// The consumer half was dropped; no further items can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ingest queue closed")]
pub struct QueueClosed;

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueProducer {
    tx: mpsc::Sender<QueueItem>,
}

/// Consumer half.
#[derive(Debug)]
pub struct QueueConsumer {
    rx: mpsc::Receiver<QueueItem>,
}

/// Create a queue holding at most `capacity` items (minimum 1).
pub fn ingest_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueProducer { tx }, QueueConsumer { rx })
}

impl QueueProducer {
    /// Enqueue an item, waiting while the queue is full.
    pub async fn put(&self, item: QueueItem) -> Result<(), QueueClosed> {
        self.tx.send(item).await.map_err(|_| QueueClosed)
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Items currently waiting to be consumed.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueConsumer {
    /// Dequeue the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` once every producer is gone and the queue drained.
    /// Cancel-safe: dropping the future never loses an item.
    pub async fn get(&mut self) -> Option<QueueItem> {
        self.rx.recv().await
    }
}
