// ── Scrape loop ──
//
// Owns the modem client and its session. Each cycle reads the telemetry
// batch, converts it to a record and enqueues it. A device-reported
// error costs one interval and a fresh login; any other cycle failure
// is logged and skipped.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use docsis_api::ModemClient;

use crate::convert::telemetry_record;
use crate::error::CoreError;
use crate::model::TelemetryRecord;
use crate::queue::{QueueItem, QueueProducer};
use crate::sink::InsertDirective;

/// Result of one scrape cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The modem answered cleanly; the record is ready to enqueue.
    Record(TelemetryRecord),
    /// The modem rejected the request or no session exists.
    ReauthRequired,
}

/// What the scrape loop hands back when it stops.
#[derive(Debug)]
pub struct ScrapeExit {
    pub client: ModemClient,
    /// Set when the loop stopped on an unrecoverable login failure.
    pub fatal: Option<CoreError>,
}

/// The producer side of the pipeline.
#[derive(Debug)]
pub struct Scraper {
    client: ModemClient,
    modem_name: String,
    producer: QueueProducer,
    directive: InsertDirective,
    interval: Duration,
}

impl Scraper {
    pub fn new(
        client: ModemClient,
        modem_name: impl Into<String>,
        producer: QueueProducer,
        directive: InsertDirective,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            modem_name: modem_name.into(),
            producer,
            directive,
            interval,
        }
    }

    pub fn client(&self) -> &ModemClient {
        &self.client
    }

    /// Log in to the modem.
    pub async fn login(&mut self) -> Result<(), CoreError> {
        self.client.login().await.map_err(CoreError::from)
    }

    /// Run one scrape cycle against the current session.
    ///
    /// Device-reported errors and a missing session yield
    /// [`CycleOutcome::ReauthRequired`]; transport and decode failures are
    /// returned as errors and leave the session untouched.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CoreError> {
        match self.client.scrape_telemetry().await {
            Ok(scrape) => Ok(CycleOutcome::Record(telemetry_record(
                &self.modem_name,
                scrape,
                Utc::now(),
            ))),
            Err(e) if e.is_device_error() => {
                warn!(error = %e, "modem rejected scrape, session must be re-established");
                Ok(CycleOutcome::ReauthRequired)
            }
            Err(docsis_api::Error::SessionNotEstablished) => Ok(CycleOutcome::ReauthRequired),
            Err(e) => Err(e.into()),
        }
    }

    /// Drive the scrape loop until `cancel` fires or login fails for good.
    ///
    /// A fatal failure cancels `cancel` itself so the worker stops too.
    pub async fn run(mut self, cancel: CancellationToken) -> ScrapeExit {
        let fatal = self.drive(&cancel).await;
        if let Some(ref e) = fatal {
            error!(error = %e, "scrape loop stopped");
            cancel.cancel();
        }
        debug!(state = %self.client.session().state(), "scrape loop exited");
        ScrapeExit {
            client: self.client,
            fatal,
        }
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Option<CoreError> {
        let login = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            result = self.login() => result,
        };
        if let Err(e) = login {
            return Some(e);
        }

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return None,
                outcome = self.run_cycle() => outcome,
            };

            match outcome {
                Ok(CycleOutcome::Record(record)) => {
                    let item = QueueItem {
                        directive: self.directive.clone(),
                        record,
                    };
                    let put = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return None,
                        put = self.producer.put(item) => put,
                    };
                    if let Err(e) = put {
                        warn!(error = %e, "stopping scrape loop");
                        return None;
                    }
                    debug!(queued = self.producer.len(), "record enqueued");
                }
                Ok(CycleOutcome::ReauthRequired) => {
                    if !sleep_or_cancel(self.interval, cancel).await {
                        return None;
                    }
                    let relogin = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return None,
                        result = self.client.login() => result,
                    };
                    match relogin.map_err(CoreError::from) {
                        Ok(()) => {
                            info!("modem session re-established");
                            continue;
                        }
                        Err(e) if e.is_fatal() => return Some(e),
                        Err(e) => warn!(error = %e, "re-login failed, retrying next cycle"),
                    }
                }
                Err(e) => warn!(error = %e, "scrape cycle failed, skipping"),
            }

            if !sleep_or_cancel(self.interval, cancel).await {
                return None;
            }
        }
    }
}

/// Sleep for `duration`. Returns `false` if cancelled first.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
