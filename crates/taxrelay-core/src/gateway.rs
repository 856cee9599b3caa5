//! The contract every remote tax client implements.

use rust_decimal::Decimal;

use crate::codes::SeverityLevel;
use crate::config::ServiceConfig;
use crate::error::TaxServiceError;
use crate::request::TaxRequest;

/// Outcome of a successful remote calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxResult {
    pub total_tax: Decimal,
    pub result_code: SeverityLevel,
}

/// A remote tax service reachable over some protocol.
///
/// Implementations classify every failure into a [`TaxServiceError`], so
/// callers never need to know which protocol was used.
pub trait TaxGateway: Send + Sync {
    /// Calculate tax for `request`. Blocks until the service answers or the
    /// config's timeout elapses.
    fn send(&self, request: &TaxRequest, config: &ServiceConfig) -> Result<TaxResult, TaxServiceError>;

    /// Whether `config`'s credentials may make tax requests.
    fn is_authorized(&self, config: &ServiceConfig) -> Result<bool, TaxServiceError>;
}

impl<G: TaxGateway + ?Sized> TaxGateway for Box<G> {
    fn send(&self, request: &TaxRequest, config: &ServiceConfig) -> Result<TaxResult, TaxServiceError> {
        (**self).send(request, config)
    }

    fn is_authorized(&self, config: &ServiceConfig) -> Result<bool, TaxServiceError> {
        (**self).is_authorized(config)
    }
}
