//! Per-integration remote service configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const SOAP_TEST_URL: &str = "https://development.avalara.net";
pub const SOAP_LIVE_URL: &str = "https://avatax.avalara.net";
pub const REST_TEST_URL: &str = "https://sandbox-rest.avatax.com/api/v2";
pub const REST_LIVE_URL: &str = "https://rest.avatax.com/api/v2";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which of the two remote environments to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    #[default]
    Test,
    Live,
}

impl Environment {
    /// `"test"` selects [`Environment::Test`]; anything else is live.
    pub fn from_mode(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("test") {
            Self::Test
        } else {
            Self::Live
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Live => "live",
        }
    }
}

impl From<String> for Environment {
    fn from(mode: String) -> Self {
        Self::from_mode(&mode)
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.as_str().to_string()
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_mode(s))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol generation spoken to the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Soap,
    #[default]
    Rest,
}

impl Protocol {
    pub fn base_url(self, env: Environment) -> &'static str {
        match (self, env) {
            (Self::Soap, Environment::Test) => SOAP_TEST_URL,
            (Self::Soap, Environment::Live) => SOAP_LIVE_URL,
            (Self::Rest, Environment::Test) => REST_TEST_URL,
            (Self::Rest, Environment::Live) => REST_LIVE_URL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Soap => "soap",
            Self::Rest => "rest",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soap" => Ok(Self::Soap),
            "rest" => Ok(Self::Rest),
            other => Err(format!("unknown protocol {other:?} (expected soap or rest)")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which wire bodies get logged.
///
/// Parsed from a comma-separated list such as `"request,response"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFlags {
    pub request: bool,
    pub response: bool,
}

impl LogFlags {
    pub fn all() -> Self {
        Self {
            request: true,
            response: true,
        }
    }
}

impl FromStr for LogFlags {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::default();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "request" => flags.request = true,
                "response" => flags.response = true,
                other => return Err(format!("unknown log target {other:?}")),
            }
        }
        Ok(flags)
    }
}

/// Credentials, endpoint and request options for one tax service integration.
///
/// Identified by `id`; see [`ConfigRegistry`](crate::ConfigRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub id: String,
    pub protocol: Protocol,
    pub url: String,
    pub account: String,
    pub license: String,
    pub tax_service: String,
    pub request_path: String,
    pub ping_path: String,
    pub adapter: String,
    pub client: String,
    pub name: String,
    pub trace: bool,
    pub log: LogFlags,
    pub timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn new(id: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            id: id.into(),
            protocol,
            url: protocol.base_url(Environment::Test).to_string(),
            account: String::new(),
            license: String::new(),
            tax_service: "/Tax/TaxSvc.asmx".to_string(),
            request_path: "/transactions/create".to_string(),
            ping_path: "/utilities/ping".to_string(),
            adapter: concat!("taxrelay,", env!("CARGO_PKG_VERSION")).to_string(),
            client: "taxrelay-core,1.0".to_string(),
            name: env!("CARGO_PKG_VERSION").to_string(),
            trace: true,
            log: LogFlags::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Point the config at the test or live base URL for its protocol.
    pub fn set_url(&mut self, mode: Environment) -> &mut Self {
        self.url = self.protocol.base_url(mode).to_string();
        self
    }

    pub fn with_credentials(mut self, account: impl Into<String>, license: impl Into<String>) -> Self {
        self.account = account.into();
        self.license = license.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Absolute URL for a service path, e.g. `config.endpoint(&config.tax_service)`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }

    /// Where tax calculations are sent for this config's protocol.
    pub fn tax_endpoint(&self) -> String {
        match self.protocol {
            Protocol::Soap => self.endpoint(&self.tax_service),
            Protocol::Rest => self.endpoint(&self.request_path),
        }
    }

    /// Where authorization checks are sent for this config's protocol.
    pub fn ping_endpoint(&self) -> String {
        match self.protocol {
            Protocol::Soap => self.endpoint(&self.tax_service),
            Protocol::Rest => self.endpoint(&self.ping_path),
        }
    }
}
