// Modem endpoint client: transport mechanics plus the login and telemetry
// operations implemented on it.

pub mod client;
mod login;
mod scrape;

pub use client::ModemClient;
pub use scrape::TelemetryScrape;
