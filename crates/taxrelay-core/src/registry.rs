//! Identifier-keyed store of [`ServiceConfig`]s, owned by the host.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::ServiceConfig;
use crate::error::TaxError;

/// Shared registry of service configs.
///
/// Registration replaces the whole entry with a fresh `Arc`, so a reader
/// that already holds a config keeps a consistent snapshot while a writer
/// swaps in a new one. Re-registering an identifier silently overwrites it.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    configs: RwLock<HashMap<String, Arc<ServiceConfig>>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `config` under its id, replacing any earlier entry.
    pub fn register(&self, config: ServiceConfig) -> Arc<ServiceConfig> {
        let config = Arc::new(config);
        let replaced = self
            .configs
            .write()
            .insert(config.id.clone(), Arc::clone(&config))
            .is_some();
        info!(
            config_id = %config.id,
            protocol = %config.protocol,
            url = %config.url,
            replaced,
            "registered tax service config"
        );
        config
    }

    pub fn get(&self, id: &str) -> Result<Arc<ServiceConfig>, TaxError> {
        self.configs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| TaxError::ConfigNotFound(id.to_string()))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.configs.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, Protocol};
    use std::thread;

    fn config(id: &str, account: &str) -> ServiceConfig {
        let mut c = ServiceConfig::new(id, Protocol::Rest).with_credentials(account, "lic");
        c.set_url(Environment::Live);
        c
    }

    #[test]
    fn register_then_get_returns_same_fields() {
        let registry = ConfigRegistry::new();
        registry.register(config("avatax", "1100"));
        let got = registry.get("avatax").unwrap();
        assert_eq!(got.account, "1100");
        assert_eq!(got.license, "lic");
        assert_eq!(got.url, crate::config::REST_LIVE_URL);
        assert!(registry.exists("avatax"));
    }

    #[test]
    fn second_register_overwrites() {
        let registry = ConfigRegistry::new();
        let first = registry.register(config("avatax", "first"));
        registry.register(config("avatax", "second"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("avatax").unwrap().account, "second");
        // A snapshot taken before the overwrite is unaffected.
        assert_eq!(first.account, "first");
    }

    #[test]
    fn get_unregistered_is_config_not_found() {
        let registry = ConfigRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.exists("missing"));
        match registry.get("missing") {
            Err(TaxError::ConfigNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_registration_is_safe() {
        let registry = Arc::new(ConfigRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..50 {
                        registry.register(config("shared", &format!("acct-{i}")));
                        assert!(registry.get("shared").is_ok());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.len(), 1);
        assert!(registry.get("shared").unwrap().account.starts_with("acct-"));
    }
}
