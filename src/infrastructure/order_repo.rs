use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrderInput, OrderLineView, OrderView, TransactionView, TransitionOutcome,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::{plan_transition, OrderStatus, PaymentStatus};
use crate::domain::stock::{ProductStatus, StockShortfall};
use crate::schema::{cart_items, order_lines, order_outbox, orders, products, transactions};

use super::models::{
    CartLineRow, NewOrderLineRow, NewOrderRow, NewOutboxEventRow, NewTransactionRow, OrderLineRow,
    OrderRow, OrderStateRow, TransactionRow,
};
use super::stock_ledger::StockLedger;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            // Both are lock contention; the caller may retry.
            diesel::result::Error::DatabaseError(_, ref info)
                if info.message().contains("lock timeout")
                    || info.message().contains("deadlock detected") =>
            {
                DomainError::LockTimeout(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Bound lock waits for the rest of the current transaction.
fn set_lock_timeout(conn: &mut PgConnection, timeout: Duration) -> Result<(), DomainError> {
    // SET does not take bind parameters; the value is a plain integer.
    diesel::sql_query(format!(
        "SET LOCAL lock_timeout = '{}ms'",
        timeout.as_millis()
    ))
    .execute(conn)?;
    Ok(())
}

fn line_subtotal(line: &CartLineRow) -> BigDecimal {
    &line.price * &BigDecimal::from(line.requested)
}

fn find_shortfalls(lines: &[CartLineRow]) -> Vec<StockShortfall> {
    lines
        .iter()
        .filter(|l| l.requested > l.available)
        .map(|l| StockShortfall {
            product_id: l.product_id,
            product_name: l.product_name.clone(),
            requested: l.requested,
            available: l.available,
        })
        .collect()
}

fn append_event(
    conn: &mut PgConnection,
    order_id: Uuid,
    event_type: &str,
    payload: serde_json::Value,
) -> Result<(), DomainError> {
    diesel::insert_into(order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: "Order".to_string(),
            aggregate_id: order_id.to_string(),
            event_type: event_type.to_string(),
            payload,
        })
        .execute(conn)?;
    Ok(())
}

fn stored_status(raw: &str) -> Result<OrderStatus, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::Internal(format!("order has unknown status '{}'", raw)))
}

impl From<TransactionRow> for TransactionView {
    fn from(t: TransactionRow) -> Self {
        TransactionView {
            id: t.id,
            order_id: t.order_id,
            amount: t.amount,
            payment_method: t.payment_method,
            transaction_type: t.transaction_type,
            status: t.status,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

fn order_view(
    o: OrderRow,
    lines: Vec<OrderLineRow>,
    transaction: Option<TransactionRow>,
) -> OrderView {
    OrderView {
        id: o.id,
        consumer_id: o.consumer_id,
        total_amount: o.total_amount,
        status: o.status,
        payment_method: o.payment_method,
        delivery_address: o.delivery_address,
        notes: o.notes,
        inventory_adjusted: o.inventory_adjusted,
        created_at: o.created_at,
        updated_at: o.updated_at,
        lines: lines
            .into_iter()
            .map(|l| OrderLineView {
                id: l.id,
                product_id: l.product_id,
                farmer_id: l.farmer_id,
                quantity: l.quantity,
                unit_price: l.unit_price,
                subtotal: l.subtotal,
            })
            .collect(),
        transaction: transaction.map(TransactionView::from),
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
    config: EngineConfig,
    ledger: StockLedger,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self {
            pool,
            config,
            ledger: StockLedger::new(config.low_stock_threshold),
        }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create_from_cart(&self, input: &NewOrderInput) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            set_lock_timeout(conn, self.config.lock_timeout)?;

            // 1. Claim the consumer's cart rows before anything else. A concurrent
            // checkout of the same cart waits here and then finds them gone.
            let claimed: Vec<Uuid> = cart_items::table
                .filter(cart_items::consumer_id.eq(input.consumer_id))
                .select(cart_items::id)
                .order(cart_items::id.asc())
                .for_update()
                .load(conn)?;
            if claimed.is_empty() {
                return Err(DomainError::EmptyCart);
            }

            // 2. Claimed lines for products still on sale, share-locked until commit.
            let lines: Vec<CartLineRow> = cart_items::table
                .inner_join(products::table)
                .filter(cart_items::id.eq_any(claimed))
                .filter(products::status.eq(ProductStatus::Available.as_str()))
                .select((
                    cart_items::id,
                    cart_items::product_id,
                    cart_items::quantity,
                    products::name,
                    products::price,
                    products::quantity,
                    products::farmer_id,
                ))
                .order(products::id.asc())
                .for_share()
                .load(conn)?;
            let lines: Vec<CartLineRow> = match &input.product_ids {
                Some(selected) => lines
                    .into_iter()
                    .filter(|l| selected.contains(&l.product_id))
                    .collect(),
                None => lines,
            };
            if lines.is_empty() {
                return Err(DomainError::EmptyCart);
            }

            // 3. Check every line before failing so the caller sees all shortfalls.
            let shortfalls = find_shortfalls(&lines);
            if !shortfalls.is_empty() {
                return Err(DomainError::InsufficientStock(shortfalls));
            }

            // 4. Order row with totals snapshotted from the prices read above.
            let order_id = Uuid::new_v4();
            let total_amount = lines
                .iter()
                .fold(BigDecimal::from(0), |acc, l| acc + line_subtotal(l));
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    consumer_id: input.consumer_id,
                    total_amount: total_amount.clone(),
                    status: OrderStatus::Pending.as_str().to_string(),
                    payment_method: input.payment_method.clone(),
                    delivery_address: input.delivery_address.clone(),
                    notes: input.notes.clone(),
                    inventory_adjusted: false,
                })
                .execute(conn)?;

            // 5. Order lines
            let new_lines: Vec<NewOrderLineRow> = lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    farmer_id: l.farmer_id,
                    quantity: l.requested,
                    unit_price: l.price.clone(),
                    subtotal: line_subtotal(l),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .execute(conn)?;

            // 6. Consume the cart: all of it, or exactly the selected lines.
            match &input.product_ids {
                None => diesel::delete(
                    cart_items::table.filter(cart_items::consumer_id.eq(input.consumer_id)),
                )
                .execute(conn)?,
                Some(_) => {
                    let ordered: Vec<Uuid> = lines.iter().map(|l| l.cart_item_id).collect();
                    diesel::delete(cart_items::table.filter(cart_items::id.eq_any(ordered)))
                        .execute(conn)?
                }
            };

            // 7. Payment record
            diesel::insert_into(transactions::table)
                .values(&NewTransactionRow {
                    id: Uuid::new_v4(),
                    order_id,
                    amount: total_amount.clone(),
                    payment_method: input.payment_method.clone(),
                    transaction_type: "payment".to_string(),
                    status: PaymentStatus::Pending.as_str().to_string(),
                })
                .execute(conn)?;

            // 8. Outbox event in the same transaction.
            let line_payloads: Vec<serde_json::Value> = new_lines
                .iter()
                .map(|l| {
                    json!({
                        "product_id": l.product_id,
                        "farmer_id": l.farmer_id,
                        "quantity": l.quantity,
                        "unit_price": l.unit_price.to_string(),
                        "subtotal": l.subtotal.to_string()
                    })
                })
                .collect();
            append_event(
                conn,
                order_id,
                "OrderCreated",
                json!({
                    "order_id": order_id,
                    "consumer_id": input.consumer_id,
                    "status": OrderStatus::Pending.as_str(),
                    "total_amount": total_amount.to_string(),
                    "lines": line_payloads
                }),
            )?;

            Ok(order_id)
        })
    }

    fn transition(&self, id: Uuid, target: OrderStatus) -> Result<TransitionOutcome, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            set_lock_timeout(conn, self.config.lock_timeout)?;

            let state = orders::table
                .find(id)
                .select(OrderStateRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;
            let current = stored_status(&state.status)?;
            let plan = plan_transition(current, state.inventory_adjusted, target)?;

            let mut adjustments = Vec::new();
            if let Some(effect) = plan.stock_effect {
                // Ascending product id keeps lock order identical across transitions.
                let lines: Vec<(Uuid, i32)> = order_lines::table
                    .filter(order_lines::order_id.eq(id))
                    .select((order_lines::product_id, order_lines::quantity))
                    .order((order_lines::product_id.asc(), order_lines::id.asc()))
                    .load(conn)?;
                for (product_id, quantity) in lines {
                    adjustments.push(self.ledger.adjust_stock(
                        conn,
                        product_id,
                        effect.delta(quantity),
                    )?);
                }
            }

            let outcome = TransitionOutcome {
                order_id: id,
                previous_status: current,
                status: plan.status,
                inventory_adjusted: plan.inventory_adjusted,
                stock_effect: plan.stock_effect,
                adjustments,
            };

            if plan.status == current && plan.stock_effect.is_none() {
                log::debug!("Order {} already {}, nothing to do", id, current);
                return Ok(outcome);
            }

            diesel::update(orders::table.find(id))
                .set((
                    orders::status.eq(plan.status.as_str()),
                    orders::inventory_adjusted.eq(plan.inventory_adjusted),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            append_event(
                conn,
                id,
                "OrderStatusChanged",
                json!({
                    "order_id": id,
                    "from": current.as_str(),
                    "to": plan.status.as_str(),
                    "inventory_adjusted": plan.inventory_adjusted,
                    "stock_effect": plan.stock_effect.map(|e| e.as_str()),
                    "clamped_products": outcome.clamped_products()
                }),
            )?;

            Ok(outcome)
        })
    }

    fn set_payment_status(
        &self,
        order_id: Uuid,
        status: PaymentStatus,
    ) -> Result<TransactionView, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<TransactionRow> =
            diesel::update(transactions::table.filter(transactions::order_id.eq(order_id)))
                .set((
                    transactions::status.eq(status.as_str()),
                    transactions::updated_at.eq(Utc::now()),
                ))
                .returning(TransactionRow::as_returning())
                .get_results(&mut conn)?;

        rows.into_iter()
            .next()
            .map(TransactionView::from)
            .ok_or(DomainError::NotFound)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = order_lines::table
            .filter(order_lines::order_id.eq(order.id))
            .select(OrderLineRow::as_select())
            .order(order_lines::product_id.asc())
            .load(&mut conn)?;

        let transaction = transactions::table
            .filter(transactions::order_id.eq(order.id))
            .select(TransactionRow::as_select())
            .order(transactions::created_at.asc())
            .first(&mut conn)
            .optional()?;

        Ok(Some(order_view(order, lines, transaction)))
    }

    fn list(
        &self,
        consumer_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = page.saturating_sub(1).saturating_mul(limit);
        conn.transaction::<_, DomainError, _>(|conn| {
            let mut count_query = orders::table.into_boxed();
            let mut rows_query = orders::table.into_boxed();
            if let Some(consumer_id) = consumer_id {
                count_query = count_query.filter(orders::consumer_id.eq(consumer_id));
                rows_query = rows_query.filter(orders::consumer_id.eq(consumer_id));
            }

            let total: i64 = count_query.count().get_result(conn)?;

            let rows = rows_query
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .map(|o| order_view(o, vec![], None))
                    .collect(),
                total,
            })
        })
    }
}
