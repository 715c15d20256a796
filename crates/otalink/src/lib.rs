//! `otalink` is a device-side client for an OTA firmware/software update
//! distribution backend.
//!
//! The client performs four operations against the backend's REST API:
//! device registration, session authentication, polling for available
//! updates, and telemetry/status reporting. Each operation is one
//! synchronous round trip: typed input is marshaled into the canonical
//! wire `json`, the request is issued through an exchangeable transport,
//! and the raw response is classified and decoded back into typed output
//! or a uniform [`Error`].
//!
//! The crate deliberately stops there. It does not retry, back off, cache,
//! or persist anything: credentials from [`register`](Client::register)
//! and the [`Session`] from [`authenticate`](Client::authenticate) are
//! handed to the caller, who owns their lifetime and decides the retry
//! policy for failed calls.
//!
//! ```no_run
//! use otalink::{Client, Filter, TransportOptions};
//!
//! fn main() -> otalink::Result<()> {
//!     let mut client = Client::new();
//!     client.init("https://updates.example.com", TransportOptions::default())?;
//!
//!     let registration = client.register("product-access", "product-secret", "serial-1234")?;
//!     let session = client.authenticate(&registration.device_access, &registration.device_secret)?;
//!
//!     let updates = client.check_for_updates(&session, &[Filter::new("firmware", "1.0")])?;
//!     for update in updates {
//!         println!("{}: {} ({:?})", update.update_id, update.version, update.download_url);
//!     }
//!
//!     client.cleanup();
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]

/// The backend client along with its initialization lifecycle.
pub mod client;
/// Error management.
pub mod error;
/// Report kinds and their wire marshaling.
pub mod report;
/// URL and query-string construction.
pub mod request;
/// Session and registration data.
pub mod session;
/// The HTTP transport collaborator interface and its `reqwest` implementation.
pub mod transport;
/// Update descriptors and response decoding.
pub mod update;

mod json;

pub use client::Client;
pub use error::{Error, ErrorKind, Result};
pub use report::{GenericEvent, Metric, Report, ReportHeader, Tag, UpdateStatus};
pub use request::Filter;
pub use session::{Registration, Session};
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportOptions, TransportResponse,
};
pub use update::Update;

/// The client library version, in semver format.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

/// Returns the current version of the client library.
#[must_use]
pub const fn library_version() -> Version {
    Version {
        major: 0,
        minor: 1,
        patch: 0,
    }
}

/// The client identity tag attached to every outgoing request.
pub const USER_AGENT: &str = "otalink/v0.1.0";
