// ── Runtime pipeline configuration ──
//
// These types describe *what* to scrape and *where* to write it.
// They carry credentials and tuning but never touch disk or the
// environment. `docsis-config` builds them and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use docsis_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Default, since modems ship self-signed certs.
    #[default]
    DangerAcceptInvalid,
}

/// How to reach and authenticate with the modem.
#[derive(Debug, Clone)]
pub struct ModemConfig {
    /// Modem base URL (e.g., `https://192.168.100.1`).
    pub url: Url,
    /// Label written into every record.
    pub name: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ModemConfig {
    /// Transport settings for the modem HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        }
    }
}

/// Where the ClickHouse sink writes.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// HTTP interface URL (e.g., `http://clickhouse:8123`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    pub database: String,
    pub table: String,
    /// Per-insert timeout.
    pub timeout: Duration,
}

impl ClickHouseConfig {
    /// Transport settings for the ClickHouse HTTP client. Verification
    /// always uses the system CA store.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::System,
            timeout: self.timeout,
        }
    }
}

/// Tuning for the scrape loop and ingest worker.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub modem: ModemConfig,
    /// Pause between scrape cycles, and before a re-login.
    pub scrape_interval: Duration,
    /// Maximum number of records waiting for the sink.
    pub queue_capacity: usize,
    /// Pause after a failed sink write.
    pub write_retry_delay: Duration,
    /// Upper bound on the best-effort logout at shutdown.
    pub logout_timeout: Duration,
}

impl ExporterConfig {
    pub const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
    pub const DEFAULT_WRITE_RETRY_DELAY: Duration = Duration::from_secs(5);
    pub const DEFAULT_LOGOUT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Config with default tuning for the given modem.
    pub fn new(modem: ModemConfig) -> Self {
        Self {
            modem,
            scrape_interval: Self::DEFAULT_SCRAPE_INTERVAL,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            write_retry_delay: Self::DEFAULT_WRITE_RETRY_DELAY,
            logout_timeout: Self::DEFAULT_LOGOUT_TIMEOUT,
        }
    }
}

pub(crate) fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn transport_carries_tls_and_timeout() {
        let modem = ModemConfig {
            url: Url::parse("https://192.168.100.1").unwrap(),
            name: "FAST3895".into(),
            username: "admin".into(),
            password: SecretString::from("pw".to_owned()),
            tls: TlsVerification::SystemDefaults,
            timeout: Duration::from_secs(12),
        };
        let transport = modem.transport();
        assert!(matches!(transport.tls, TlsMode::System));
        assert_eq!(transport.timeout, Duration::from_secs(12));

        let config = ExporterConfig::new(modem);
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.write_retry_delay, Duration::from_secs(5));
    }
}
