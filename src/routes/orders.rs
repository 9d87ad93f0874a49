use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderList, OrderWithItems, RegisterShipmentRequest,
        TransferProofRequest,
    },
    error::AppResult,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{checkout_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/mark-processed", post(mark_processed))
        .route("/{id}/mark-delivered", post(mark_delivered))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/confirm-transfer", post(confirm_transfer))
        .route("/{id}/approve-transfer", post(approve_transfer))
        .route("/{id}/shipment", post(register_shipment))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "List orders", body = ApiResponse<OrderList>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Unknown product or variant"),
        (status = 409, description = "Insufficient stock")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = checkout_service::create_order(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/mark-processed",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order processed", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Wrong predecessor state")
    ),
    tag = "Orders"
)]
pub async fn mark_processed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::mark_processed(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/mark-delivered",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order delivered", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Wrong predecessor state")
    ),
    tag = "Orders"
)]
pub async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::mark_delivered(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled, stock restored", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order already terminal")
    ),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/confirm-transfer",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = TransferProofRequest,
    responses(
        (status = 200, description = "Transfer proof recorded", body = ApiResponse<Order>),
        (status = 400, description = "Invalid proof"),
        (status = 409, description = "Order not awaiting transfer proof")
    ),
    tag = "Orders"
)]
pub async fn confirm_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransferProofRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::confirm_transfer(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/approve-transfer",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Transfer approved", body = ApiResponse<Order>),
        (status = 409, description = "Order not under payment review")
    ),
    tag = "Orders"
)]
pub async fn approve_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::approve_transfer(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/shipment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = RegisterShipmentRequest,
    responses(
        (status = 200, description = "Shipment registered at carrier", body = ApiResponse<Order>),
        (status = 409, description = "Order not processed or already tracked"),
        (status = 502, description = "Carrier unavailable")
    ),
    tag = "Orders"
)]
pub async fn register_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegisterShipmentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::register_shipment(&state, id, payload).await?;
    Ok(Json(resp))
}
