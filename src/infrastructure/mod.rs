pub mod models;
pub mod order_repo;
pub mod schema_check;
pub mod stock_ledger;

#[cfg(test)]
pub(crate) mod test_support;
