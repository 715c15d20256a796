use std::borrow::Cow;

use tracing::error;

/// All possible error kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An operation was invoked before [`init`](crate::Client::init)
    /// succeeded.
    NotInitialized,
    /// A required argument was empty or internally inconsistent.
    InvalidInput,
    /// The backend responded with an HTTP status of 400 or above.
    Http,
    /// A transport failure with no usable status, malformed `json`, or a
    /// response document missing a required field.
    Unclassified,
}

impl ErrorKind {
    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::NotInitialized => "Not Initialized",
            Self::InvalidInput => "Invalid Input",
            Self::Http => "Http",
            Self::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.description().fmt(f)
    }
}

// Every error kind except `Http` carries this fixed code.
const DEFAULT_CODE: u16 = 500;

/// A client error.
///
/// Carries a classification, an HTTP-like numeric code, and a formatted
/// description. The code is the actual backend status for
/// [`ErrorKind::Http`] and `500` for every other kind.
#[derive(PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    code: u16,
    description: Cow<'static, str>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.format(f)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.format(f)
    }
}

impl Error {
    /// Creates an [`Error`] from an [`ErrorKind`] and a description.
    ///
    /// The description is also emitted at error severity.
    #[inline]
    pub fn new(kind: ErrorKind, description: impl Into<Cow<'static, str>>) -> Self {
        Self::with_code(kind, DEFAULT_CODE, description)
    }

    /// Creates an [`ErrorKind::Http`] error carrying the backend status.
    #[inline]
    pub fn http(status: u16, description: impl Into<Cow<'static, str>>) -> Self {
        Self::with_code(ErrorKind::Http, status, description)
    }

    fn with_code(kind: ErrorKind, code: u16, description: impl Into<Cow<'static, str>>) -> Self {
        let description = description.into();
        error!("{}", description.as_ref());
        Self {
            kind,
            code,
            description,
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the numeric code associated with the error.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Returns the formatted description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    fn format(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.code, self.description)
    }
}

impl std::error::Error for Error {}

/// A specialized [`Result`] type for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn non_http_errors_carry_code_500() {
        for kind in [
            ErrorKind::NotInitialized,
            ErrorKind::InvalidInput,
            ErrorKind::Unclassified,
        ] {
            let error = Error::new(kind, "Process failed.");
            assert_eq!(error.code(), 500);
            assert_eq!(error.kind(), kind);
            assert!(!error.description().is_empty());
        }
    }

    #[test]
    fn http_error_carries_backend_status() {
        let error = Error::http(404, "Not found.");

        assert_eq!(error.kind(), ErrorKind::Http);
        assert_eq!(error.code(), 404);
        assert_eq!(error.to_string(), "Http (404): Not found.");
    }

    #[test]
    fn error_formatting() {
        let error = Error::new(ErrorKind::NotInitialized, "Called before init.");

        assert_eq!(
            error.to_string(),
            "Not Initialized (500): Called before init."
        );
    }
}
