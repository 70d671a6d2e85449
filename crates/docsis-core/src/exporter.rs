// ── Exporter ──
//
// Lifecycle coordinator: wires the modem client, the ingest queue, the
// scrape loop and the ingest worker together, then waits for the
// cancellation token. Nothing here is global; `main` builds one
// `Exporter` from explicit config.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use docsis_api::ModemClient;

use crate::config::ExporterConfig;
use crate::error::CoreError;
use crate::queue::ingest_queue;
use crate::scraper::Scraper;
use crate::sink::Sink;
use crate::worker::ingest_task;

/// Scrape-and-ingest pipeline for one modem.
pub struct Exporter<S: Sink> {
    config: ExporterConfig,
    sink: Arc<S>,
    cancel: CancellationToken,
}

impl<S: Sink> Exporter<S> {
    pub fn new(config: ExporterConfig, sink: S) -> Self {
        Self {
            config,
            sink: Arc::new(sink),
            cancel: CancellationToken::new(),
        }
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Token that stops the pipeline when cancelled. Clone it into
    /// signal handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request shutdown. Calling this more than once is harmless.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("shutdown requested");
        }
        self.cancel.cancel();
    }

    /// Run until the shutdown token is cancelled.
    ///
    /// Returns the error that stopped the scrape loop, if any: a failed
    /// initial login, or a re-login the modem rejected.
    pub async fn run(&self) -> Result<(), CoreError> {
        let modem = &self.config.modem;
        let client = ModemClient::new(
            modem.url.clone(),
            modem.username.clone(),
            modem.password.clone(),
            &modem.transport(),
        )?;

        let (producer, consumer) = ingest_queue(self.config.queue_capacity);
        let scraper = Scraper::new(
            client,
            modem.name.clone(),
            producer,
            self.sink.insert_directive(),
            self.config.scrape_interval,
        );

        info!(
            modem = %modem.url,
            name = %modem.name,
            interval_secs = self.config.scrape_interval.as_secs(),
            queue_capacity = self.config.queue_capacity,
            "starting exporter"
        );

        // Either task ending, by return or by panic, cancels the token.
        let scrape_guard = self.cancel.clone().drop_guard();
        let scrape_handle = tokio::spawn({
            let cancel = self.cancel.clone();
            async move {
                let _guard = scrape_guard;
                scraper.run(cancel).await
            }
        });
        let ingest_guard = self.cancel.clone().drop_guard();
        let ingest_handle = tokio::spawn({
            let sink = Arc::clone(&self.sink);
            let retry_delay = self.config.write_retry_delay;
            let cancel = self.cancel.clone();
            async move {
                let _guard = ingest_guard;
                ingest_task(consumer, sink, retry_delay, cancel).await
            }
        });

        self.cancel.cancelled().await;
        debug!("shutdown token cancelled, joining tasks");

        let scrape_exit = scrape_handle
            .await
            .map_err(|e| CoreError::Internal(format!("scrape task panicked: {e}")))?;
        match ingest_handle.await {
            Ok(stats) => debug!(written = stats.written, dropped = stats.dropped, "ingest worker joined"),
            Err(e) => warn!(error = %e, "ingest task panicked"),
        }

        let mut client = scrape_exit.client;
        if client.session().is_authenticated() {
            match tokio::time::timeout(self.config.logout_timeout, client.logout()).await {
                Ok(Ok(())) => debug!("logged out of modem"),
                Ok(Err(e)) => warn!(error = %e, "logout failed (non-fatal)"),
                Err(_) => warn!("logout timed out (non-fatal)"),
            }
        }
        drop(client);

        info!("exporter stopped");
        scrape_exit.fatal.map_or(Ok(()), Err)
    }
}
