use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::stock::{ProductStatus, StockAdjustment, StockLevel};
use crate::schema::products;

use super::models::ProductStockRow;

/// The only writer of `products.quantity`, `products.status` and
/// `products.is_low_stock`.
///
/// Every call must run inside the caller's transaction: the product row is
/// locked with `FOR UPDATE` and stays locked until that transaction ends.
#[derive(Debug, Clone, Copy)]
pub struct StockLedger {
    low_stock_threshold: i32,
}

impl StockLedger {
    pub fn new(low_stock_threshold: i32) -> Self {
        Self {
            low_stock_threshold,
        }
    }

    pub fn adjust_stock(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        delta: i32,
    ) -> Result<StockAdjustment, DomainError> {
        let row = products::table
            .find(product_id)
            .select(ProductStockRow::as_select())
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::Internal(format!("product {} not found", product_id)))?;

        let status: ProductStatus = row.status.parse().map_err(|_| {
            DomainError::Internal(format!(
                "product {} has unknown status '{}'",
                product_id, row.status
            ))
        })?;
        let level = StockLevel {
            quantity: row.quantity,
            status,
            is_low_stock: row.is_low_stock,
        };
        let adjustment = level.apply(product_id, delta, self.low_stock_threshold);

        if adjustment.clamped {
            log::warn!(
                "Oversell on product {}: {} {:+} floored to 0",
                product_id,
                adjustment.previous_quantity,
                delta
            );
        }

        diesel::update(products::table.find(product_id))
            .set((
                products::quantity.eq(adjustment.quantity),
                products::status.eq(adjustment.status.as_str()),
                products::is_low_stock.eq(adjustment.is_low_stock),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

        Ok(adjustment)
    }
}
