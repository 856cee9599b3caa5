//! Remote tax clients: the REST and SOAP protocol generations behind one
//! [`TaxGateway`].

mod http;
#[cfg(feature = "rest")]
pub mod rest;
#[cfg(feature = "soap")]
pub mod soap;

#[cfg(feature = "rest")]
pub use rest::RestClient;
#[cfg(feature = "soap")]
pub use soap::SoapClient;

use taxrelay_core::{Protocol, ServiceConfig, TaxGateway, TaxRequest, TaxResult, TaxServiceError};

/// Picks the protocol client from each call's [`ServiceConfig::protocol`].
#[derive(Clone)]
pub struct RemoteTaxClient {
    #[cfg(feature = "rest")]
    rest: RestClient,
    #[cfg(feature = "soap")]
    soap: SoapClient,
}

impl RemoteTaxClient {
    /// Create a client for every compiled-in protocol, sharing one HTTP pool.
    pub fn new() -> Result<Self, TaxServiceError> {
        #[allow(unused_variables)]
        let client = http::build_client()?;
        Ok(Self {
            #[cfg(feature = "rest")]
            rest: RestClient::with_client(client.clone()),
            #[cfg(feature = "soap")]
            soap: SoapClient::with_client(client),
        })
    }

    fn gateway(&self, protocol: Protocol) -> Result<&dyn TaxGateway, TaxServiceError> {
        match protocol {
            #[cfg(feature = "rest")]
            Protocol::Rest => Ok(&self.rest),
            #[cfg(feature = "soap")]
            Protocol::Soap => Ok(&self.soap),
            #[allow(unreachable_patterns)]
            other => Err(TaxServiceError::transport(format!(
                "protocol {other} is not compiled into this build"
            ))),
        }
    }

    /// Render the request body `send` would post, without sending it.
    pub fn render(&self, request: &TaxRequest, config: &ServiceConfig) -> Result<String, TaxServiceError> {
        match config.protocol {
            #[cfg(feature = "rest")]
            Protocol::Rest => RestClient::render(request),
            #[cfg(feature = "soap")]
            Protocol::Soap => Ok(SoapClient::render(request, config)),
            #[allow(unreachable_patterns)]
            other => Err(TaxServiceError::transport(format!(
                "protocol {other} is not compiled into this build"
            ))),
        }
    }
}

impl TaxGateway for RemoteTaxClient {
    fn send(&self, request: &TaxRequest, config: &ServiceConfig) -> Result<TaxResult, TaxServiceError> {
        self.gateway(config.protocol)?.send(request, config)
    }

    fn is_authorized(&self, config: &ServiceConfig) -> Result<bool, TaxServiceError> {
        self.gateway(config.protocol)?.is_authorized(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(feature = "rest", feature = "soap"))]
    fn all_protocols_compiled_by_default() {
        let client = RemoteTaxClient::new().unwrap();
        assert!(client.gateway(Protocol::Rest).is_ok());
        assert!(client.gateway(Protocol::Soap).is_ok());
    }
}
