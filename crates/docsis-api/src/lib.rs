// docsis-api: Async Rust client for the Sagemcom FAST3895 JSON-RPC interface

pub mod auth;
pub mod error;
pub mod modem;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use auth::{AuthKeyInput, derive_auth_key};
pub use error::Error;
pub use modem::{ModemClient, TelemetryScrape};
pub use session::{Session, SessionState};
pub use telemetry::{
    LoadAverage, MemoryStatus, ProcessStatus, RawDownstream, RawUpstream, TelemetryAction,
    TelemetryReply,
};
pub use transport::{TlsMode, TransportConfig};
