//! Host-facing configuration surface of the tax service plugin.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codes::{CustomerUsageType, DocumentType};
use crate::config::{DEFAULT_TIMEOUT, Environment, LogFlags, Protocol, ServiceConfig};
use crate::error::TaxError;
use crate::registry::ConfigRegistry;

/// Everything an administrator configures for one tax service instance.
///
/// Each field maps 1:1 onto [`ServiceConfig`] or onto the request the
/// assembler builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxServiceSettings {
    /// Identifier the derived [`ServiceConfig`] is registered under.
    pub plugin_id: String,
    pub account: String,
    pub license: String,
    pub company_code: String,
    pub include_shipping: bool,
    pub trace: bool,
    pub log: LogFlags,
    pub mode: Environment,
    pub protocol: Protocol,
    /// Overrides the protocol's base URL for the selected mode.
    pub url: Option<String>,
    /// `None` waits indefinitely.
    #[serde(with = "timeout_secs")]
    pub timeout: Option<Duration>,
    pub customer_usage_type: CustomerUsageType,
    pub document_type: DocumentType,
}

impl Default for TaxServiceSettings {
    fn default() -> Self {
        Self {
            plugin_id: "taxrelay".to_string(),
            account: String::new(),
            license: String::new(),
            company_code: String::new(),
            include_shipping: false,
            trace: false,
            log: LogFlags::default(),
            mode: Environment::Test,
            protocol: Protocol::default(),
            url: None,
            timeout: Some(DEFAULT_TIMEOUT),
            customer_usage_type: CustomerUsageType::default(),
            document_type: DocumentType::default(),
        }
    }
}

impl TaxServiceSettings {
    /// Reject settings that could never authenticate or address a company.
    pub fn validate(&self) -> Result<(), TaxError> {
        let required = [
            ("plugin id", &self.plugin_id),
            ("account", &self.account),
            ("license", &self.license),
            ("company code", &self.company_code),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TaxError::InvalidSettings(format!(
                "a value must be set for: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(&self.plugin_id, self.protocol)
            .with_credentials(&self.account, &self.license);
        config.set_url(self.mode);
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        config.trace = self.trace;
        config.log = self.log;
        config.timeout = self.timeout;
        config
    }

    /// Validate, then register the derived config. Call on every settings change.
    pub fn register(&self, registry: &ConfigRegistry) -> Result<Arc<ServiceConfig>, TaxError> {
        self.validate()?;
        Ok(registry.register(self.service_config()))
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs))
    }
}
