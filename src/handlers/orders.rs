use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::order::{NewOrderInput, OrderView, TransactionView, TransitionOutcome};
use crate::errors::AppError;
use crate::AppOrderService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub consumer_id: Uuid,
    /// e.g. "cod", "gcash"
    pub payment_method: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    /// Check out only the cart lines for these products. Omit to order the
    /// whole cart.
    pub product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of pending, processing, shipped, delivered, cancelled.
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    /// One of pending, paid, failed.
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockAdjustmentResponse {
    pub product_id: Uuid,
    pub delta: i32,
    pub previous_quantity: i32,
    pub quantity: i32,
    pub status: String,
    pub is_low_stock: bool,
    pub clamped: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub order_id: Uuid,
    pub previous_status: String,
    pub status: String,
    pub inventory_adjusted: bool,
    /// "consume", "restore", or null when stock was not touched.
    pub stock_effect: Option<String>,
    pub adjustments: Vec<StockAdjustmentResponse>,
    /// Products whose stock was floored at zero (oversell).
    pub clamped_products: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: String,
    pub payment_method: String,
    pub transaction_type: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub farmer_id: Uuid,
    pub quantity: i32,
    pub unit_price: String,
    pub subtotal: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub total_amount: String,
    pub status: String,
    pub payment_method: String,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub inventory_adjusted: bool,
    pub created_at: String,
    pub updated_at: String,
    pub lines: Vec<OrderLineResponse>,
    pub transaction: Option<TransactionResponse>,
}

impl From<TransactionView> for TransactionResponse {
    fn from(t: TransactionView) -> Self {
        TransactionResponse {
            id: t.id,
            order_id: t.order_id,
            amount: t.amount.to_string(),
            payment_method: t.payment_method,
            transaction_type: t.transaction_type,
            status: t.status,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            consumer_id: o.consumer_id,
            total_amount: o.total_amount.to_string(),
            status: o.status,
            payment_method: o.payment_method,
            delivery_address: o.delivery_address,
            notes: o.notes,
            inventory_adjusted: o.inventory_adjusted,
            created_at: o.created_at.to_rfc3339(),
            updated_at: o.updated_at.to_rfc3339(),
            lines: o
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    product_id: l.product_id,
                    farmer_id: l.farmer_id,
                    quantity: l.quantity,
                    unit_price: l.unit_price.to_string(),
                    subtotal: l.subtotal.to_string(),
                })
                .collect(),
            transaction: o.transaction.map(TransactionResponse::from),
        }
    }
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(t: TransitionOutcome) -> Self {
        let clamped_products = t.clamped_products();
        TransitionResponse {
            order_id: t.order_id,
            previous_status: t.previous_status.to_string(),
            status: t.status.to_string(),
            inventory_adjusted: t.inventory_adjusted,
            stock_effect: t.stock_effect.map(|e| e.as_str().to_string()),
            adjustments: t
                .adjustments
                .into_iter()
                .map(|a| StockAdjustmentResponse {
                    product_id: a.product_id,
                    delta: a.delta,
                    previous_quantity: a.previous_quantity,
                    quantity: a.quantity,
                    status: a.status.to_string(),
                    is_low_stock: a.is_low_stock,
                    clamped: a.clamped,
                })
                .collect(),
            clamped_products,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Only orders placed by this consumer.
    pub consumer_id: Option<Uuid>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Turns the consumer's cart into a pending order. Stock is checked for every
/// line but not decremented; that happens when the order is delivered.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = CreateOrderResponse),
        (status = 400, description = "Blank payment method or delivery address"),
        (status = 409, description = "Insufficient stock, body lists every shortfall"),
        (status = 422, description = "No available products in the cart"),
        (status = 503, description = "Lock timeout, safe to retry"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<AppOrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let input = NewOrderInput {
        consumer_id: body.consumer_id,
        payment_method: body.payment_method,
        delivery_address: body.delivery_address,
        notes: body.notes,
        product_ids: body.product_ids,
    };

    let id = web::block(move || service.create_order(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CreateOrderResponse { id }))
}

/// PUT /orders/{id}/status
///
/// Moves the order to a new status. Delivery consumes the order's stock and
/// cancelling a delivered order restores it, each exactly once.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Transition applied", body = TransitionResponse),
        (status = 400, description = "Unknown status value"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is in a terminal state"),
        (status = 503, description = "Lock timeout, safe to retry"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;

    let outcome = web::block(move || service.update_status(order_id, &status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TransitionResponse::from(outcome)))
}

/// PUT /orders/{id}/payment-status
///
/// Records the payment outcome. Has no effect on stock.
#[utoipa::path(
    put,
    path = "/orders/{id}/payment-status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment record updated", body = TransactionResponse),
        (status = 400, description = "Unknown payment status"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_payment_status(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;

    let transaction = web::block(move || service.update_payment_status(order_id, &status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}

/// GET /orders/{id}
///
/// Returns the order together with its lines and payment record.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let result = web::block(move || service.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders
///
/// Returns a paginated list of orders (without their lines), newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || service.list_orders(params.consumer_id, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}
