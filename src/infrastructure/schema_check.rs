use std::collections::HashSet;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use thiserror::Error;

/// Columns the order engine reads or writes. `orders.status` together with
/// `orders.inventory_adjusted` is the exactly-once guard.
const REQUIRED_COLUMNS: &[(&str, &str)] = &[
    ("products", "farmer_id"),
    ("products", "price"),
    ("products", "quantity"),
    ("products", "status"),
    ("products", "is_low_stock"),
    ("cart_items", "consumer_id"),
    ("cart_items", "product_id"),
    ("cart_items", "quantity"),
    ("orders", "total_amount"),
    ("orders", "status"),
    ("orders", "inventory_adjusted"),
    ("order_lines", "farmer_id"),
    ("order_lines", "unit_price"),
    ("order_lines", "subtotal"),
    ("transactions", "status"),
    ("order_outbox", "payload"),
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Database migration required, missing columns: {}", .0.join(", "))]
    MigrationRequired(Vec<String>),
    #[error("Schema inspection failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Could not get a database connection: {0}")]
    Pool(#[from] r2d2::Error),
}

#[derive(QueryableByName)]
struct ColumnRef {
    #[diesel(sql_type = Text)]
    table_name: String,
    #[diesel(sql_type = Text)]
    column_name: String,
}

/// Refuse to serve against a schema that lacks engine columns. The schema is
/// never altered here; apply migrations instead.
pub fn verify_schema(conn: &mut PgConnection) -> Result<(), SchemaError> {
    let present: HashSet<(String, String)> = diesel::sql_query(
        "SELECT table_name::text AS table_name, column_name::text AS column_name \
         FROM information_schema.columns WHERE table_schema = current_schema()",
    )
    .load::<ColumnRef>(conn)?
    .into_iter()
    .map(|c| (c.table_name, c.column_name))
    .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|(table, column)| !present.contains(&(table.to_string(), column.to_string())))
        .map(|(table, column)| format!("{}.{}", table, column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MigrationRequired(missing))
    }
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;

    use super::{verify_schema, SchemaError};
    use crate::infrastructure::test_support::setup_db;

    #[tokio::test]
    async fn migrated_schema_passes() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");

        verify_schema(&mut conn).expect("schema should be complete");
    }

    #[tokio::test]
    async fn missing_guard_column_requires_migration() {
        let (_container, pool) = setup_db().await;
        let mut conn = pool.get().expect("Failed to get connection");
        diesel::sql_query("ALTER TABLE orders DROP COLUMN inventory_adjusted")
            .execute(&mut conn)
            .expect("alter failed");

        let err = verify_schema(&mut conn).unwrap_err();

        match err {
            SchemaError::MigrationRequired(missing) => {
                assert_eq!(missing, vec!["orders.inventory_adjusted".to_string()]);
            }
            other => panic!("expected MigrationRequired, got {other:?}"),
        }
    }
}
