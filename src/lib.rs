pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::{AppConfig, EngineConfig};
pub use db::{create_pool, DbPool};

use application::order_service::OrderService;
use infrastructure::order_repo::DieselOrderRepository;
use infrastructure::schema_check::{verify_schema, SchemaError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type AppOrderService = OrderService<DieselOrderRepository>;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::orders::update_payment_status,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::CreateOrderResponse,
        handlers::orders::UpdateStatusRequest,
        handlers::orders::UpdatePaymentStatusRequest,
        handlers::orders::TransitionResponse,
        handlers::orders::StockAdjustmentResponse,
        handlers::orders::TransactionResponse,
        handlers::orders::OrderLineResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
    )),
    tags((name = "orders", description = "Order lifecycle and inventory"))
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Fail fast when the database lacks columns the order engine depends on.
pub fn check_schema(pool: &DbPool) -> Result<(), SchemaError> {
    let mut conn = pool.get()?;
    verify_schema(&mut conn)
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    engine: EngineConfig,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(OrderService::new(DieselOrderRepository::new(pool, engine)));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}/status", web::put().to(handlers::orders::update_status))
                    .route(
                        "/{id}/payment-status",
                        web::put().to(handlers::orders::update_payment_status),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
