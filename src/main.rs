use dotenvy::dotenv;
use rice_order_engine::{build_server, check_schema, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url)?;
    if config.run_migrations {
        run_migrations(&pool)?;
    }
    if let Err(e) = check_schema(&pool) {
        log::error!("Refusing to start: {}", e);
        return Err(e.into());
    }

    log::info!(
        "Starting server at http://{}:{} (low stock threshold {}, lock timeout {:?})",
        config.host,
        config.port,
        config.engine.low_stock_threshold,
        config.engine.lock_timeout
    );

    build_server(pool, config.engine, &config.host, config.port)?.await?;
    Ok(())
}
