use std::path::PathBuf;

use tracing::debug;

use crate::USER_AGENT;

/// Configuration handed to [`Transport::init`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Route every request through this proxy.
    pub proxy: Option<String>,
    /// Use this CA bundle for TLS verification instead of system defaults.
    pub ca_path: Option<PathBuf>,
}

/// A raw backend response: the numeric status code and the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

/// A transport-level failure with no usable status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a [`TransportError`] from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for TransportError {}

/// The HTTP transport collaborator.
///
/// The protocol layer never issues requests itself; it goes through this
/// trait, which must be able to `GET` and `POST` with optional bearer-token
/// authentication and return the body along with the numeric status code.
///
/// [`init`](Transport::init) and [`shutdown`](Transport::shutdown) are the
/// transport's one-time global hooks, driven by
/// [`Client::init`](crate::Client::init) and
/// [`Client::cleanup`](crate::Client::cleanup). They must not be called
/// while any request of this transport is in flight.
pub trait Transport {
    /// One-time global initialization with the given options.
    fn init(&mut self, options: &TransportOptions) -> Result<(), TransportError>;

    /// Releases the transport's global resources.
    fn shutdown(&mut self);

    /// Issues a `GET` request, attaching `Authorization: Bearer <token>`
    /// when a token is given.
    fn get(&self, url: &str, token: Option<&str>) -> Result<TransportResponse, TransportError>;

    /// Issues a `POST` request with a `json` body, attaching
    /// `Authorization: Bearer <token>` when a token is given.
    fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: &str,
    ) -> Result<TransportResponse, TransportError>;
}

/// The production [`Transport`] built on a blocking `reqwest` client.
///
/// The inner client is constructed once by [`init`](Transport::init) and
/// shared by all subsequent requests; each call is one synchronous round
/// trip. Timeouts, retries, and connection pooling details are left to
/// `reqwest` and the caller.
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    client: Option<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    /// Creates a [`ReqwestTransport`] without initializing it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        self.client
            .as_ref()
            .ok_or_else(|| TransportError::new("Transport used before initialization."))
    }

    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
        token: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn init(&mut self, options: &TransportOptions) -> Result<(), TransportError> {
        if self.client.is_some() {
            return Ok(());
        }

        let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);

        if let Some(ref proxy) = options.proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| TransportError::new(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        if let Some(ref ca_path) = options.ca_path {
            let pem =
                std::fs::read(ca_path).map_err(|e| TransportError::new(e.to_string()))?;
            let certificate = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| TransportError::new(e.to_string()))?;
            builder = builder.add_root_certificate(certificate);
        }

        self.client = Some(
            builder
                .build()
                .map_err(|e| TransportError::new(e.to_string()))?,
        );

        Ok(())
    }

    fn shutdown(&mut self) {
        self.client = None;
    }

    fn get(&self, url: &str, token: Option<&str>) -> Result<TransportResponse, TransportError> {
        debug!("GET {url}");
        self.send(self.client()?.get(url), token)
    }

    fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: &str,
    ) -> Result<TransportResponse, TransportError> {
        debug!("POST {url}");
        self.send(
            self.client()?
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_owned()),
            token,
        )
    }
}
