// Telemetry scrape
//
// One signed batch of the nine telemetry reads, timed from just before
// the request is sent until the reply body has been parsed.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::Error;
use crate::modem::client::ModemClient;
use crate::telemetry::{TelemetryReply, telemetry_actions};

/// A decoded telemetry reply plus how long the modem took to produce it.
#[derive(Debug, Clone)]
pub struct TelemetryScrape {
    pub reply: TelemetryReply,
    pub latency: Duration,
}

impl ModemClient {
    /// Read device and DOCSIS channel telemetry.
    ///
    /// Returns [`Error::Device`] when the modem answers with an error
    /// descriptor; the session is invalidated and the caller is expected
    /// to log in again. [`Error::SessionNotEstablished`] means `login()`
    /// has not succeeded since the last invalidation.
    pub async fn scrape_telemetry(&mut self) -> Result<TelemetryScrape, Error> {
        let start = Instant::now();
        let reply = self.session_request(telemetry_actions()).await?;
        let latency = start.elapsed();

        if !reply.is_ok() {
            warn!(error = %reply.error.description, "modem rejected telemetry request");
            self.session_mut().invalidate();
            return Err(Error::Device {
                description: reply.error.description,
            });
        }

        let decoded = TelemetryReply::decode(&reply)?;
        debug!(
            request_id = self.session().request_counter(),
            latency_ms = latency.as_millis(),
            downstreams = decoded.downstreams.len(),
            upstreams = decoded.upstreams.len(),
            "scraped modem telemetry"
        );

        Ok(TelemetryScrape {
            reply: decoded,
            latency,
        })
    }
}
