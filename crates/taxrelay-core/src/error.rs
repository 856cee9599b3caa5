use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Broad category of a failed remote tax call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The call never produced a usable response: connection error, HTTP
    /// error status, SOAP fault.
    Transport,
    /// The service answered but gave no usable tax figure: non-success
    /// result code, zero or missing total, malformed body.
    RemoteCalculation,
}

/// The one error type every remote client returns, whatever the protocol.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaxServiceError {
    kind: FailureKind,
    message: String,
    code: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl TaxServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: message.into(),
            code: None,
            source: None,
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RemoteCalculation,
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// A response that lacks the fields the protocol promises.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::remote(format!("malformed response: {}", message.into()))
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upstream error code (HTTP status, SOAP fault code or result code).
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum TaxError {
    #[error("tax service config {0:?} is not registered")]
    ConfigNotFound(String),

    #[error("invalid tax service settings: {0}")]
    InvalidSettings(String),

    #[error("could not calculate sales tax: {0}")]
    Service(#[from] TaxServiceError),
}

impl TaxError {
    /// The remote failure behind this error, if it came from a client.
    pub fn service(&self) -> Option<&TaxServiceError> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_is_a_remote_calculation_failure() {
        let e = TaxServiceError::malformed("no totalTax");
        assert_eq!(e.kind(), FailureKind::RemoteCalculation);
        assert_eq!(e.to_string(), "malformed response: no totalTax");
    }

    #[test]
    fn code_and_source_are_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let e = TaxServiceError::transport("connect failed")
            .with_code("503")
            .with_source(io);
        assert_eq!(e.kind(), FailureKind::Transport);
        assert_eq!(e.code(), Some("503"));
        assert!(e.source().is_some());
    }

    #[test]
    fn tax_error_wraps_service_error() {
        let e: TaxError = TaxServiceError::remote("Error").with_code("Error").into();
        assert!(e.to_string().starts_with("could not calculate sales tax"));
        assert_eq!(e.service().and_then(|s| s.code()), Some("Error"));
        assert!(TaxError::ConfigNotFound("x".into()).service().is_none());
    }
}
