//! Order items and shipments -> numbered tax lines.
//!
//! Product lines come first, in the order's item order, then one freight
//! line per shipment. Numbering starts at 1 and is contiguous across both.
//!
//! Two inputs are skipped without error and do not consume a line number:
//!
//! - an order item whose purchased entity no longer exists (no SKU to send)
//! - a shipment whose amount is absent or zero

use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{Order, OrderItem, Shipment};

/// Tax code the remote service uses to classify freight charges.
pub const FREIGHT_TAX_CODE: &str = "FR";

/// One taxable unit within a tax request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// 1-based position within the request.
    pub number: u32,
    pub item_code: String,
    pub description: String,
    pub quantity: u32,
    pub amount: Decimal,
    pub tax_code: Option<String>,
}

impl LineItem {
    pub fn is_freight(&self) -> bool {
        self.tax_code.as_deref() == Some(FREIGHT_TAX_CODE)
    }
}

/// Accumulates lines and hands out sequence numbers.
#[derive(Debug, Default)]
pub struct LineItemBuilder {
    lines: Vec<LineItem>,
}

impl LineItemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every line for `order`; freight lines only when `include_shipping`.
    pub fn build(order: &Order, include_shipping: bool) -> Vec<LineItem> {
        let mut builder = Self::new();
        for item in &order.items {
            builder.add_item(item);
        }
        if include_shipping {
            for shipment in &order.shipments {
                builder.add_freight(shipment);
            }
        }
        builder.finish()
    }

    /// Append a product line. Returns `false` if the item was skipped.
    pub fn add_item(&mut self, item: &OrderItem) -> bool {
        let Some(entity) = &item.purchased_entity else {
            debug!(title = %item.title, "skipping order item without purchased entity");
            return false;
        };
        let number = self.next_number();
        self.lines.push(LineItem {
            number,
            item_code: entity.sku.clone(),
            description: item.title.clone(),
            quantity: item.quantity,
            amount: item.total_price.number,
            tax_code: None,
        });
        true
    }

    /// Append a freight line. Returns `false` if the shipment was skipped.
    pub fn add_freight(&mut self, shipment: &Shipment) -> bool {
        let amount = match &shipment.amount {
            Some(price) if !price.number.is_zero() => price.number,
            _ => {
                debug!(
                    method = %shipment.shipping_method.id,
                    "skipping shipment with no charge"
                );
                return false;
            }
        };
        let number = self.next_number();
        self.lines.push(LineItem {
            number,
            item_code: shipment.shipping_method.id.clone(),
            description: shipment.shipping_method.name.clone(),
            quantity: 1,
            amount,
            tax_code: Some(FREIGHT_TAX_CODE.to_string()),
        });
        true
    }

    pub fn finish(self) -> Vec<LineItem> {
        self.lines
    }

    fn next_number(&self) -> u32 {
        self.lines.len() as u32 + 1
    }
}
