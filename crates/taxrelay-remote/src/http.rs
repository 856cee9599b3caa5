//! Transport plumbing shared by both protocol clients.

use reqwest::blocking::{Client, RequestBuilder};
use taxrelay_core::{ServiceConfig, TaxServiceError};

/// Log target for request/response bodies.
pub(crate) const WIRE_TARGET: &str = "taxrelay::wire";

/// Build the blocking HTTP client.
///
/// No client-wide timeout is set; each request applies its config's.
pub(crate) fn build_client() -> Result<Client, TaxServiceError> {
    Client::builder()
        .timeout(None)
        .user_agent(concat!("taxrelay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TaxServiceError::transport(format!("could not build HTTP client: {e}")).with_source(e))
}

/// Apply the config's timeout, if it has one.
pub(crate) fn with_timeout(builder: RequestBuilder, config: &ServiceConfig) -> RequestBuilder {
    match config.timeout {
        Some(timeout) => builder.timeout(timeout),
        None => builder,
    }
}

/// Client identification string: `{client}; {name}; {adapter}`.
pub(crate) fn client_id(config: &ServiceConfig) -> String {
    format!("{}; {}; {}", config.client, config.name, config.adapter)
}

pub(crate) fn transport_error(url: &str, e: reqwest::Error) -> TaxServiceError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    let mut err = TaxServiceError::transport(format!("request to {url} {kind}: {e}"));
    if let Some(status) = e.status() {
        err = err.with_code(status.as_u16().to_string());
    }
    err.with_source(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxrelay_core::Protocol;

    #[test]
    fn client_id_joins_version_tags() {
        let mut config = ServiceConfig::new("tax", Protocol::Rest);
        config.client = "shop".into();
        config.name = "1.2".into();
        config.adapter = "taxrelay,0.1.0".into();
        assert_eq!(client_id(&config), "shop; 1.2; taxrelay,0.1.0");
    }

    #[test]
    fn client_builds() {
        assert!(build_client().is_ok());
    }
}
