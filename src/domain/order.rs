use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::status::{OrderStatus, StockEffect};
use super::stock::StockAdjustment;

/// Checkout request for a consumer's cart.
///
/// `product_ids` narrows the checkout to the cart lines for those products;
/// `None` orders (and clears) the whole cart.
#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub consumer_id: Uuid,
    pub payment_method: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub farmer_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct TransactionView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub payment_method: String,
    pub transaction_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_method: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub inventory_adjusted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
    pub transaction: Option<TransactionView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub order_id: Uuid,
    pub previous_status: OrderStatus,
    pub status: OrderStatus,
    pub inventory_adjusted: bool,
    pub stock_effect: Option<StockEffect>,
    pub adjustments: Vec<StockAdjustment>,
}

impl TransitionOutcome {
    /// Products whose stock was floored at zero by this transition (oversell).
    pub fn clamped_products(&self) -> Vec<Uuid> {
        self.adjustments
            .iter()
            .filter(|a| a.clamped)
            .map(|a| a.product_id)
            .collect()
    }
}
