use serde_json::json;

use crate::error::{Error, ErrorKind, Result};
use crate::report::{Report, ReportHeader, encode_batch};
use crate::request::{Filter, build_url};
use crate::session::{Registration, Session, parse_registration, parse_session};
use crate::transport::{
    ReqwestTransport, Transport, TransportError, TransportOptions, TransportResponse,
};
use crate::update::{Update, decode_update_list};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Config {
    server_url: String,
    options: TransportOptions,
}

// The init-once/cleanup-once lifecycle, made explicit.
#[derive(Debug, PartialEq, Eq)]
enum State {
    Uninitialized,
    Initialized(Config),
}

fn invalid_input(description: impl Into<std::borrow::Cow<'static, str>>) -> Error {
    Error::new(ErrorKind::InvalidInput, description)
}

/// A client for the update distribution backend.
///
/// The client holds the process configuration (backend base URL, optional
/// proxy, optional CA bundle path) established once by
/// [`init`](Client::init) and read by every operation. Each of the four
/// backend operations ([`register`](Client::register),
/// [`authenticate`](Client::authenticate),
/// [`check_for_updates`](Client::check_for_updates) and
/// [`report`](Client::report)) performs one synchronous round trip and
/// returns a typed result or an [`Error`]; retry policy and credential
/// persistence are the caller's responsibility.
///
/// [`init`] and [`cleanup`](Client::cleanup) take `&mut self` and must not
/// overlap with in-flight operations; the operations themselves take
/// `&self` and may run concurrently once initialization has completed.
///
/// [`init`]: Client::init
#[derive(Debug)]
pub struct Client<T = ReqwestTransport> {
    transport: T,
    state: State,
}

impl Default for Client<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl Client<ReqwestTransport> {
    /// Creates an uninitialized [`Client`] backed by the blocking `reqwest`
    /// transport.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl<T: Transport> Client<T> {
    /// Creates an uninitialized [`Client`] backed by the given transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            state: State::Uninitialized,
        }
    }

    /// Returns an immutable reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns whether [`init`](Client::init) has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Initialized(_))
    }

    /// Establishes the client configuration and runs the transport's
    /// one-time global initialization.
    ///
    /// Idempotent: when the client is already initialized the call returns
    /// success without altering the stored configuration, so the URL,
    /// proxy, and CA path can only change across a
    /// [`cleanup`](Client::cleanup).
    ///
    /// # Errors
    ///
    /// An empty `server_url` is rejected as invalid input; a transport
    /// initialization failure is surfaced as an unclassified error.
    pub fn init(&mut self, server_url: &str, options: TransportOptions) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        if server_url.is_empty() {
            return Err(invalid_input("Initialized with an empty server url"));
        }

        self.transport.init(&options).map_err(|e| {
            Error::new(
                ErrorKind::Unclassified,
                format!("Failed to globally initialize the transport: {e}"),
            )
        })?;

        self.state = State::Initialized(Config {
            server_url: server_url.to_owned(),
            options,
        });

        Ok(())
    }

    /// Releases the stored configuration and the transport's global
    /// resources. Idempotent; a second call is a no-op.
    pub fn cleanup(&mut self) {
        if self.is_initialized() {
            self.transport.shutdown();
            self.state = State::Uninitialized;
        }
    }

    fn config(&self, operation: &'static str) -> Result<&Config> {
        match &self.state {
            State::Initialized(config) => Ok(config),
            State::Uninitialized => Err(Error::new(
                ErrorKind::NotInitialized,
                format!("{operation} called without initializing"),
            )),
        }
    }

    // Shared status classification: a transport failure with no usable
    // status is unclassified, a status of 400 or above is an http error,
    // anything else hands the body to the operation's decoder.
    fn classify(
        &self,
        result: std::result::Result<TransportResponse, TransportError>,
        what: &str,
    ) -> Result<String> {
        let response = result
            .map_err(|e| Error::new(ErrorKind::Unclassified, format!("{what} failed: {e}")))?;

        if response.status >= 400 {
            return Err(Error::http(
                response.status,
                format!("{what} failed with http error code {}", response.status),
            ));
        }

        // A response with no body and a passing status is a transport
        // failure, not a backend reply.
        if response.body.is_empty() {
            return Err(Error::new(
                ErrorKind::Unclassified,
                format!("{what} failed: empty response from the backend"),
            ));
        }

        Ok(response.body)
    }

    /// Registers a new device, called once in a device's lifetime.
    ///
    /// On success the returned [`Registration`] carries the device
    /// credentials and the suggested poll interval; persist them for the
    /// lifetime of the device.
    ///
    /// # Errors
    ///
    /// Fails when the client is not initialized, when any input is empty,
    /// when the backend responds with a status of 400 or above, or when
    /// the response document is malformed.
    pub fn register(
        &self,
        product_access: &str,
        product_secret: &str,
        device_id: &str,
    ) -> Result<Registration> {
        let config = self.config("register")?;

        if product_access.is_empty() || product_secret.is_empty() || device_id.is_empty() {
            return Err(invalid_input("Registered with invalid input parameters"));
        }

        let body = json!({
            "deviceId": device_id,
            "productAuthParameters": {
                "accessKey": product_access,
                "secretKey": product_secret,
            },
        })
        .to_string();

        let url = build_url(&config.server_url, &["register"], &[]);
        let raw = self.classify(self.transport.post(&url, None, &body), "Posting register")?;

        parse_registration(&raw)
    }

    /// Starts a new session with the backend.
    ///
    /// All subsequent [`check_for_updates`](Client::check_for_updates) and
    /// [`report`](Client::report) calls expect the returned [`Session`];
    /// when the session expires, authenticate again.
    ///
    /// # Errors
    ///
    /// Fails when the client is not initialized, when either credential is
    /// empty, when the backend responds with a status of 400 or above, or
    /// when the response document is missing any session field.
    pub fn authenticate(&self, device_access: &str, device_secret: &str) -> Result<Session> {
        let config = self.config("authenticate")?;

        if device_access.is_empty() || device_secret.is_empty() {
            return Err(invalid_input("Authenticated with invalid input parameters"));
        }

        let body = json!({
            "deviceAuthParameters": {
                "accessKey": device_access,
                "secretKey": device_secret,
            },
        })
        .to_string();

        let url = build_url(&config.server_url, &["authenticate"], &[]);
        let raw = self.classify(
            self.transport.post(&url, None, &body),
            "Posting authenticate",
        )?;

        parse_session(&raw)
    }

    /// Checks the backend for updates available to this device.
    ///
    /// Filters are appended to the query string in input order. The caller
    /// is responsible for processing the returned descriptors.
    ///
    /// # Errors
    ///
    /// Fails when the client is not initialized, when the session is
    /// incomplete, when the backend responds with a status of 400 or
    /// above, or when the response body cannot be decoded.
    pub fn check_for_updates(&self, session: &Session, filters: &[Filter]) -> Result<Vec<Update>> {
        let config = self.config("check-for-updates")?;

        if !session.is_complete() {
            return Err(invalid_input(
                "Checked for updates with an incomplete session",
            ));
        }

        let url = build_url(
            &config.server_url,
            &[
                "device",
                &session.product_guid,
                &session.device_guid,
                "check-for-updates",
            ],
            filters,
        );

        let raw = self.classify(
            self.transport.get(&url, Some(&session.token)),
            "Getting check-for-updates",
        )?;

        decode_update_list(&raw)
    }

    /// Sends a batch of one or more reports to the backend.
    ///
    /// # Errors
    ///
    /// Fails when the client is not initialized, when the session is
    /// incomplete, when the batch is empty, or when the backend responds
    /// with a status of 400 or above.
    pub fn report(
        &self,
        session: &Session,
        filters: &[Filter],
        header: &ReportHeader,
        reports: &[Report],
    ) -> Result<()> {
        let config = self.config("report")?;

        if !session.is_complete() {
            return Err(invalid_input("Reported with an incomplete session"));
        }

        if reports.is_empty() {
            return Err(invalid_input("Reported without any reports"));
        }

        let body = encode_batch(header, reports).to_string();

        let url = build_url(
            &config.server_url,
            &[
                "device",
                &session.product_guid,
                &session.device_guid,
                "report",
            ],
            filters,
        );

        self.classify(
            self.transport.post(&url, Some(&session.token), &body),
            "Posting report",
        )?;

        Ok(())
    }
}
