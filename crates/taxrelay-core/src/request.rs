//! Assembly of a complete tax request from an order.

use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::address::Address;
use crate::codes::{CustomerUsageType, DocumentType};
use crate::lines::{LineItem, LineItemBuilder};
use crate::model::{Order, PostalAddress};
use crate::settings::TaxServiceSettings;

/// The canonical document sent to the remote service for one calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRequest {
    pub company_code: String,
    pub document_type: DocumentType,
    /// The order number.
    pub document_code: String,
    pub date: NaiveDate,
    pub customer_code: String,
    pub customer_usage_type: CustomerUsageType,
    pub currency_code: String,
    pub origin: Address,
    pub destination: Address,
    pub lines: Vec<LineItem>,
}

/// Which order profile supplies the destination address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Billing,
    Shipping,
}

impl ProfileKind {
    /// Freight-bearing orders (shipping included and at least one shipment)
    /// are taxed at the shipping address; everything else at billing.
    pub fn for_order(order: &Order, include_shipping: bool) -> Self {
        if include_shipping && order.has_shipments() {
            Self::Shipping
        } else {
            Self::Billing
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Billing => "billing",
            Self::Shipping => "shipping",
        })
    }
}

/// The destination address the order would be taxed at, if it has one.
pub fn destination_address(order: &Order, kind: ProfileKind) -> Option<&PostalAddress> {
    let profile = match kind {
        ProfileKind::Billing => order.billing_profile.as_ref(),
        ProfileKind::Shipping => order.shipping_profile.as_ref(),
    };
    profile.and_then(|p| p.populated_address())
}

pub struct TaxRequestAssembler<'a> {
    settings: &'a TaxServiceSettings,
}

impl<'a> TaxRequestAssembler<'a> {
    pub fn new(settings: &'a TaxServiceSettings) -> Self {
        Self { settings }
    }

    /// Build the request for `order`.
    ///
    /// Returns `None` when the destination profile has no address; the
    /// caller treats that as "nothing to calculate".
    pub fn assemble(&self, order: &Order) -> Option<TaxRequest> {
        let kind = ProfileKind::for_order(order, self.settings.include_shipping);
        let destination = destination_address(order, kind)?;
        let lines = LineItemBuilder::build(order, self.settings.include_shipping);
        debug!(
            order_number = %order.order_number,
            profile = %kind,
            lines = lines.len(),
            "assembled tax request"
        );

        Some(TaxRequest {
            company_code: self.settings.company_code.clone(),
            document_type: self.settings.document_type,
            document_code: order.order_number.clone(),
            date: order.created.date_naive(),
            customer_code: order.customer_id.clone(),
            customer_usage_type: self.settings.customer_usage_type,
            currency_code: order.currency_code.clone(),
            origin: Address::normalize(&order.store.address),
            destination: Address::normalize(destination),
            lines,
        })
    }
}
