use thiserror::Error;

use super::status::OrderStatus;
use super::stock::StockShortfall;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    NotFound,
    #[error("Cart has no available products to order")]
    EmptyCart,
    #[error("Insufficient stock for {} product(s)", .0.len())]
    InsufficientStock(Vec<StockShortfall>),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Cannot change order status from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Lock timeout: {0}")]
    LockTimeout(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn insufficient_stock_display_counts_shortfalls() {
        let shortfall = |name: &str| StockShortfall {
            product_id: Uuid::new_v4(),
            product_name: name.to_string(),
            requested: 5,
            available: 3,
        };
        let err = DomainError::InsufficientStock(vec![shortfall("Jasmine"), shortfall("Basmati")]);
        assert_eq!(err.to_string(), "Insufficient stock for 2 product(s)");
    }

    #[test]
    fn illegal_transition_display_names_both_states() {
        let err = DomainError::IllegalTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Delivered,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change order status from cancelled to delivered"
        );
    }
}
