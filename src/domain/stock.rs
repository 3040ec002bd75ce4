//! Stock arithmetic shared by the ledger.
//!
//! Everything here is pure: the ledger loads a product row under lock, feeds
//! it through [`StockLevel::apply`] and writes the result back in one update.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Pending,
    Available,
    OutOfStock,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Available => "available",
            ProductStatus::OutOfStock => "out_of_stock",
            ProductStatus::Rejected => "rejected",
        }
    }

    /// Moderation states are owned by the product workflow, not by stock.
    pub fn is_moderated(self) -> bool {
        matches!(self, ProductStatus::Pending | ProductStatus::Rejected)
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "available" => Ok(ProductStatus::Available),
            "out_of_stock" => Ok(ProductStatus::OutOfStock),
            "rejected" => Ok(ProductStatus::Rejected),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Snapshot of the ledger-owned fields of one product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub quantity: i32,
    pub status: ProductStatus,
    pub is_low_stock: bool,
}

/// Result of applying one delta to one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub delta: i32,
    pub previous_quantity: i32,
    pub quantity: i32,
    pub status: ProductStatus,
    pub is_low_stock: bool,
    /// The delta would have driven stock below zero and was floored.
    pub clamped: bool,
}

/// One cart line that asks for more than is on hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortfall {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested: i32,
    pub available: i32,
}

/// Low stock means "running out", so an empty product is not low.
pub fn is_low_stock(quantity: i32, threshold: i32) -> bool {
    quantity > 0 && quantity <= threshold
}

impl StockLevel {
    pub fn apply(&self, product_id: Uuid, delta: i32, threshold: i32) -> StockAdjustment {
        let raw = self.quantity.saturating_add(delta);
        let quantity = raw.max(0);

        let status = if self.status.is_moderated() {
            self.status
        } else if quantity == 0 {
            ProductStatus::OutOfStock
        } else {
            ProductStatus::Available
        };

        StockAdjustment {
            product_id,
            delta,
            previous_quantity: self.quantity,
            quantity,
            status,
            is_low_stock: is_low_stock(quantity, threshold),
            clamped: raw < 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available(quantity: i32) -> StockLevel {
        StockLevel {
            quantity,
            status: ProductStatus::Available,
            is_low_stock: false,
        }
    }

    #[test]
    fn consuming_into_low_band_flags_low_stock() {
        let adj = available(10).apply(Uuid::new_v4(), -6, 5);
        assert_eq!(adj.quantity, 4);
        assert_eq!(adj.status, ProductStatus::Available);
        assert!(adj.is_low_stock);
        assert!(!adj.clamped);
    }

    #[test]
    fn restoring_above_threshold_clears_low_stock() {
        let level = StockLevel {
            quantity: 4,
            status: ProductStatus::Available,
            is_low_stock: true,
        };
        let adj = level.apply(Uuid::new_v4(), 6, 5);
        assert_eq!(adj.quantity, 10);
        assert!(!adj.is_low_stock);
        assert_eq!(adj.previous_quantity, 4);
    }

    #[test]
    fn oversell_is_floored_at_zero_and_marked() {
        let adj = available(6).apply(Uuid::new_v4(), -8, 5);
        assert_eq!(adj.quantity, 0);
        assert_eq!(adj.status, ProductStatus::OutOfStock);
        assert!(!adj.is_low_stock, "empty is not low");
        assert!(adj.clamped);
    }

    #[test]
    fn exact_depletion_is_not_a_clamp() {
        let adj = available(3).apply(Uuid::new_v4(), -3, 5);
        assert_eq!(adj.quantity, 0);
        assert_eq!(adj.status, ProductStatus::OutOfStock);
        assert!(!adj.clamped);
    }

    #[test]
    fn restoring_out_of_stock_product_makes_it_available() {
        let level = StockLevel {
            quantity: 0,
            status: ProductStatus::OutOfStock,
            is_low_stock: false,
        };
        let adj = level.apply(Uuid::new_v4(), 2, 5);
        assert_eq!(adj.quantity, 2);
        assert_eq!(adj.status, ProductStatus::Available);
        assert!(adj.is_low_stock);
    }

    #[test]
    fn moderation_status_survives_adjustment() {
        let level = StockLevel {
            quantity: 5,
            status: ProductStatus::Rejected,
            is_low_stock: true,
        };
        let adj = level.apply(Uuid::new_v4(), -5, 5);
        assert_eq!(adj.quantity, 0);
        assert_eq!(adj.status, ProductStatus::Rejected);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert!(is_low_stock(5, 5));
        assert!(!is_low_stock(6, 5));
        assert!(!is_low_stock(0, 5));
        assert!(!is_low_stock(1, 0));
    }

    #[test]
    fn huge_restore_saturates_instead_of_overflowing() {
        let adj = available(i32::MAX - 1).apply(Uuid::new_v4(), 10, 5);
        assert_eq!(adj.quantity, i32::MAX);
        assert!(!adj.clamped);
    }

    #[test]
    fn product_status_parses_stored_values() {
        assert_eq!(
            "out_of_stock".parse::<ProductStatus>().unwrap(),
            ProductStatus::OutOfStock
        );
        assert!("sold".parse::<ProductStatus>().is_err());
    }
}
