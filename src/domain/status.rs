//! Order status machine.
//!
//! The stock effect of a transition is decided by the `inventory_adjusted`
//! flag, not by the status string: an order consumes stock when it becomes
//! `delivered` while unadjusted, and gives it back when it becomes `cancelled`
//! while adjusted. Repeating either call finds the flag already flipped and
//! touches no stock.

use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Direction in which a transition moves the order's lines through the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Consume,
    Restore,
}

impl StockEffect {
    /// Signed ledger delta for a line of `quantity` units.
    pub fn delta(self, quantity: i32) -> i32 {
        match self {
            StockEffect::Consume => -quantity,
            StockEffect::Restore => quantity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockEffect::Consume => "consume",
            StockEffect::Restore => "restore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub status: OrderStatus,
    pub inventory_adjusted: bool,
    pub stock_effect: Option<StockEffect>,
}

pub fn plan_transition(
    current: OrderStatus,
    inventory_adjusted: bool,
    target: OrderStatus,
) -> Result<TransitionPlan, DomainError> {
    let allowed = match current {
        OrderStatus::Delivered => matches!(target, OrderStatus::Delivered | OrderStatus::Cancelled),
        OrderStatus::Cancelled => target == OrderStatus::Cancelled,
        _ => true,
    };
    if !allowed {
        return Err(DomainError::IllegalTransition {
            from: current,
            to: target,
        });
    }

    let plan = match (target, inventory_adjusted) {
        (OrderStatus::Delivered, false) => TransitionPlan {
            status: target,
            inventory_adjusted: true,
            stock_effect: Some(StockEffect::Consume),
        },
        (OrderStatus::Cancelled, true) => TransitionPlan {
            status: target,
            inventory_adjusted: false,
            stock_effect: Some(StockEffect::Restore),
        },
        _ => TransitionPlan {
            status: target,
            inventory_adjusted,
            stock_effect: None,
        },
    };
    Ok(plan)
}
