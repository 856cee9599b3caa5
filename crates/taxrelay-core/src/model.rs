//! Host commerce types consumed by the tax pipeline.
//!
//! These mirror the shape of the host's order, store and shipment data. The
//! pipeline reads them and only ever writes back one thing: the tax
//! [`Adjustment`] appended to [`Order::adjustments`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A currency-tagged monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub number: Decimal,
    pub currency_code: String,
}

impl Price {
    pub fn new(number: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            number,
            currency_code: currency_code.into(),
        }
    }
}

/// A postal address as the host stores it.
///
/// Field names follow the host's conventions (`locality`,
/// `administrative_area`), not the remote service's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub locality: String,
    pub administrative_area: String,
    pub postal_code: String,
    pub country_code: String,
}

impl PostalAddress {
    /// True when every field is blank, i.e. the host field holds no address.
    pub fn is_empty(&self) -> bool {
        [
            self.address_line1.as_str(),
            self.address_line2.as_deref().unwrap_or_default(),
            self.locality.as_str(),
            self.administrative_area.as_str(),
            self.postal_code.as_str(),
            self.country_code.as_str(),
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

/// A customer profile (billing or shipping) attached to an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub address: Option<PostalAddress>,
}

impl Profile {
    /// The profile's address, if it has a non-empty one.
    pub fn populated_address(&self) -> Option<&PostalAddress> {
        self.address.as_ref().filter(|a| !a.is_empty())
    }
}

/// The selling store. Its address is the origin of every shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    pub address: PostalAddress,
}

/// The catalog entity an order item was bought from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasedEntity {
    pub sku: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub title: String,
    pub quantity: u32,
    pub total_price: Price,
    /// `None` when the referenced product no longer exists.
    #[serde(default)]
    pub purchased_entity: Option<PurchasedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub amount: Option<Price>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Tax,
    /// Any adjustment the host applied for another reason (promotion, fee...).
    /// Carried through untouched.
    #[serde(other)]
    Other,
}

/// A price change applied to an order on top of its item totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub label: String,
    pub amount: Price,
    /// Identifier of whatever produced the adjustment.
    pub source_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_number: String,
    pub customer_id: String,
    pub currency_code: String,
    pub created: DateTime<Utc>,
    pub store: Store,
    #[serde(default)]
    pub billing_profile: Option<Profile>,
    #[serde(default)]
    pub shipping_profile: Option<Profile>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl Order {
    pub fn add_adjustment(&mut self, adjustment: Adjustment) {
        self.adjustments.push(adjustment);
    }

    pub fn has_shipments(&self) -> bool {
        !self.shipments.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn usd(amount: &str) -> Price {
        Price::new(amount.parse().unwrap(), "USD")
    }

    pub fn address(line1: &str, city: &str, region: &str, zip: &str) -> PostalAddress {
        PostalAddress {
            address_line1: line1.into(),
            address_line2: None,
            locality: city.into(),
            administrative_area: region.into(),
            postal_code: zip.into(),
            country_code: "US".into(),
        }
    }

    pub fn item(sku: &str, title: &str, quantity: u32, total: &str) -> OrderItem {
        OrderItem {
            title: title.into(),
            quantity,
            total_price: usd(total),
            purchased_entity: Some(PurchasedEntity { sku: sku.into() }),
        }
    }

    pub fn shipment(method_id: &str, name: &str, amount: Option<&str>) -> Shipment {
        Shipment {
            shipping_method: ShippingMethod {
                id: method_id.into(),
                name: name.into(),
            },
            amount: amount.map(usd),
        }
    }

    /// An order with a billing address and the given items, no shipments.
    pub fn order(items: Vec<OrderItem>) -> Order {
        Order {
            order_number: "1001".into(),
            customer_id: "42".into(),
            currency_code: "USD".into(),
            created: Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap(),
            store: Store {
                name: "Main street store".into(),
                address: address("900 Winslow Way E", "Bainbridge Island", "WA", "98110"),
            },
            billing_profile: Some(Profile {
                address: Some(address("2000 Main St", "Irvine", "CA", "92614")),
            }),
            shipping_profile: None,
            items,
            shipments: Vec::new(),
            adjustments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn blank_address_is_empty() {
        let blank = PostalAddress {
            address_line2: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert!(!address("1 Main", "Seattle", "WA", "98101").is_empty());
    }

    #[test]
    fn profile_without_populated_address() {
        let none = Profile { address: None };
        let blank = Profile {
            address: Some(PostalAddress::default()),
        };
        assert!(none.populated_address().is_none());
        assert!(blank.populated_address().is_none());
    }

    #[test]
    fn order_json_defaults() {
        let json = r#"{
            "order_number": "7",
            "customer_id": "3",
            "currency_code": "EUR",
            "created": "2024-01-02T03:04:05Z",
            "store": {
                "name": "s",
                "address": { "address_line1": "1 Rue", "country_code": "FR" }
            }
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.items.is_empty());
        assert!(order.billing_profile.is_none());
        assert!(!order.has_shipments());
        assert_eq!(order.store.address.locality, "");
    }

    #[test]
    fn add_adjustment_appends() {
        let mut order = order(vec![item("A", "a", 1, "1.00")]);
        order.add_adjustment(Adjustment {
            kind: AdjustmentKind::Tax,
            label: "Sales tax".into(),
            amount: usd("0.10"),
            source_id: "tax".into(),
        });
        assert_eq!(order.adjustments.len(), 1);
        assert_eq!(order.adjustments[0].amount.number.to_string(), "0.10");
    }

    #[test]
    fn host_adjustments_of_other_kinds_are_kept() {
        let mut order: Order = serde_json::from_value(serde_json::json!({
            "order_number": "7",
            "customer_id": "1",
            "currency_code": "USD",
            "created": "2024-03-15T12:30:00Z",
            "store": { "name": "s", "address": {} },
            "adjustments": [{
                "kind": "promotion",
                "label": "Spring sale",
                "amount": { "number": "-2.00", "currency_code": "USD" },
                "source_id": "promo-1"
            }]
        }))
        .unwrap();
        assert_eq!(order.adjustments[0].kind, AdjustmentKind::Other);

        order.add_adjustment(Adjustment {
            kind: AdjustmentKind::Tax,
            label: "Sales tax".into(),
            amount: usd("0.10"),
            source_id: "tax".into(),
        });
        let kinds: Vec<_> = order.adjustments.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AdjustmentKind::Other, AdjustmentKind::Tax]);
        assert_eq!(order.adjustments[0].label, "Spring sale");
    }
}
