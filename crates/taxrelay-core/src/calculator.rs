//! Plugin-facing entry point: order in, tax adjustment out.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::TaxError;
use crate::gateway::TaxGateway;
use crate::model::{Adjustment, AdjustmentKind, Order, Price};
use crate::registry::ConfigRegistry;
use crate::request::{ProfileKind, TaxRequestAssembler};
use crate::settings::TaxServiceSettings;

pub const TAX_ADJUSTMENT_LABEL: &str = "Sales tax";

/// Why a calculation ended without contacting the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination profile is missing or has an empty address.
    MissingAddress(ProfileKind),
}

/// Terminal state of a calculation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    /// The adjustment that was applied to the order.
    Computed(Adjustment),
}

/// Runs one tax calculation per [`execute`](Self::execute) call.
///
/// The registry and gateway are injected; the config is looked up by
/// `settings.plugin_id` on every call, so the host must have registered it
/// (see [`TaxServiceSettings::register`]).
pub struct TaxCalculator<G> {
    settings: TaxServiceSettings,
    registry: Arc<ConfigRegistry>,
    gateway: G,
}

impl<G: TaxGateway> TaxCalculator<G> {
    pub fn new(settings: TaxServiceSettings, registry: Arc<ConfigRegistry>, gateway: G) -> Self {
        Self {
            settings,
            registry,
            gateway,
        }
    }

    pub fn settings(&self) -> &TaxServiceSettings {
        &self.settings
    }

    /// Calculate tax for `order` and apply it as an adjustment.
    ///
    /// Failures are returned, never swallowed; whether they abort the
    /// surrounding order workflow is the caller's decision.
    pub fn execute(&self, order: &mut Order) -> Result<Outcome, TaxError> {
        let Some(request) = TaxRequestAssembler::new(&self.settings).assemble(order) else {
            let kind = ProfileKind::for_order(order, self.settings.include_shipping);
            info!(
                order_number = %order.order_number,
                profile = %kind,
                "no destination address, skipping tax calculation"
            );
            return Ok(Outcome::Skipped(SkipReason::MissingAddress(kind)));
        };

        let config = self.registry.get(&self.settings.plugin_id)?;
        let result = self.gateway.send(&request, &config).map_err(|e| {
            warn!(
                order_number = %order.order_number,
                config_id = %config.id,
                code = e.code().unwrap_or_default(),
                error = %e,
                "tax calculation failed"
            );
            TaxError::from(e)
        })?;

        let adjustment = Adjustment {
            kind: AdjustmentKind::Tax,
            label: TAX_ADJUSTMENT_LABEL.to_string(),
            amount: Price::new(result.total_tax, order.currency_code.clone()),
            source_id: self.settings.plugin_id.clone(),
        };
        order.add_adjustment(adjustment.clone());
        info!(
            order_number = %order.order_number,
            total_tax = %result.total_tax,
            currency = %order.currency_code,
            "applied tax adjustment"
        );
        Ok(Outcome::Computed(adjustment))
    }

    /// Ask the remote service whether the registered credentials are accepted.
    pub fn check_authorization(&self) -> Result<bool, TaxError> {
        let config = self.registry.get(&self.settings.plugin_id)?;
        Ok(self.gateway.is_authorized(&config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::SeverityLevel;
    use crate::config::ServiceConfig;
    use crate::error::{FailureKind, TaxServiceError};
    use crate::gateway::TaxResult;
    use crate::model::Profile;
    use crate::model::fixtures::{item, order};
    use crate::request::TaxRequest;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;

    /// Replays a canned answer and records what it was sent.
    struct FakeGateway {
        answer: Box<dyn Fn() -> Result<TaxResult, TaxServiceError> + Send + Sync>,
        sent: Mutex<Vec<TaxRequest>>,
    }

    impl FakeGateway {
        fn returning(total: &str) -> Self {
            let total: Decimal = total.parse().unwrap();
            Self {
                answer: Box::new(move || {
                    Ok(TaxResult {
                        total_tax: total,
                        result_code: SeverityLevel::Success,
                    })
                }),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Box::new(|| Err(TaxServiceError::remote("Error").with_code("Error"))),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.sent.lock().len()
        }
    }

    impl TaxGateway for FakeGateway {
        fn send(&self, request: &TaxRequest, _: &ServiceConfig) -> Result<TaxResult, TaxServiceError> {
            self.sent.lock().push(request.clone());
            (self.answer)()
        }

        fn is_authorized(&self, config: &ServiceConfig) -> Result<bool, TaxServiceError> {
            Ok(config.account == "1100")
        }
    }

    fn settings() -> TaxServiceSettings {
        TaxServiceSettings {
            plugin_id: "avatax".into(),
            account: "1100".into(),
            license: "key".into(),
            company_code: "ABC".into(),
            ..Default::default()
        }
    }

    fn calculator(gateway: FakeGateway) -> TaxCalculator<FakeGateway> {
        let registry = Arc::new(ConfigRegistry::new());
        settings().register(&registry).unwrap();
        TaxCalculator::new(settings(), registry, gateway)
    }

    #[test]
    fn computed_tax_is_applied_in_order_currency() {
        let calc = calculator(FakeGateway::returning("3.00"));
        let mut o = order(vec![item("A", "a", 1, "10.00"), item("B", "b", 1, "20.00")]);

        let outcome = calc.execute(&mut o).unwrap();
        let Outcome::Computed(adj) = outcome else {
            panic!("expected Computed, got {outcome:?}");
        };
        assert_eq!(adj.amount.number.to_string(), "3.00");
        assert_eq!(adj.amount.currency_code, "USD");
        assert_eq!(adj.kind, AdjustmentKind::Tax);
        assert_eq!(adj.source_id, "avatax");
        assert_eq!(o.adjustments, vec![adj]);

        let sent = calc.gateway.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].company_code, "ABC");
        assert_eq!(sent[0].lines.len(), 2);
    }

    #[test]
    fn missing_address_is_silent_no_op() {
        let calc = calculator(FakeGateway::returning("3.00"));
        let mut o = order(vec![item("A", "a", 1, "10.00")]);
        o.billing_profile = Some(Profile { address: None });

        let outcome = calc.execute(&mut o).unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::MissingAddress(ProfileKind::Billing))
        );
        assert_eq!(calc.gateway.calls(), 0);
        assert!(o.adjustments.is_empty());
    }

    #[test]
    fn failure_propagates_and_leaves_order_untouched() {
        let calc = calculator(FakeGateway::failing());
        let mut o = order(vec![item("A", "a", 1, "10.00")]);

        let err = calc.execute(&mut o).unwrap_err();
        let service = err.service().expect("service error");
        assert_eq!(service.kind(), FailureKind::RemoteCalculation);
        assert_eq!(service.code(), Some("Error"));
        assert!(o.adjustments.is_empty());
        assert_eq!(calc.gateway.calls(), 1);
    }

    #[test]
    fn unregistered_config_is_fatal() {
        let calc = TaxCalculator::new(
            settings(),
            Arc::new(ConfigRegistry::new()),
            FakeGateway::returning("1.00"),
        );
        let mut o = order(vec![item("A", "a", 1, "10.00")]);
        assert!(matches!(
            calc.execute(&mut o),
            Err(TaxError::ConfigNotFound(id)) if id == "avatax"
        ));
        assert_eq!(calc.gateway.calls(), 0);
    }

    #[test]
    fn check_authorization_uses_registered_config() {
        let calc = calculator(FakeGateway::returning("0"));
        assert!(calc.check_authorization().unwrap());
    }
}
