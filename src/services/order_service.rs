use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    carrier::ImportShipmentRequest,
    dto::orders::{OrderList, OrderWithItems, RegisterShipmentRequest, TransferProofRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Order, OrderStatus},
    payments::PaymentStatus,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::checkout_service::{order_from_entity, order_item_from_entity},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = OrderStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("Estado desconocido: {status}")))?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Pedidos",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido no encontrado".into()))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Pedido",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// PENDING_PAYMENT -> PROCESSED. Ships a notification when a tracking number
/// is already attached; the email never fails the transition.
pub async fn mark_processed(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    require_status(&order, OrderStatus::PendingPayment)?;

    let order = set_status(&state.orm, order, OrderStatus::Processed).await?;
    audit_transition(state, &order, "order_mark_processed").await;

    if let Some(tracking) = order.tracking_number.as_deref() {
        state
            .mailer
            .send_best_effort(
                &order.customer_email,
                "Tu pedido está en camino",
                &format!("Tu pedido {} fue despachado. Seguimiento: {tracking}.", order.id),
            )
            .await;
    }

    Ok(transition_response(order))
}

/// PROCESSED -> DELIVERED, stamping the delivery timestamp.
pub async fn mark_delivered(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    require_status(&order, OrderStatus::Processed)?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Delivered.as_str().to_string());
    active.estimated_delivery = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit_transition(state, &order, "order_mark_delivered").await;

    state
        .mailer
        .send_best_effort(
            &order.customer_email,
            "Tu pedido fue entregado",
            &format!("Tu pedido {} fue entregado. ¡Gracias por tu compra!", order.id),
        )
        .await;

    Ok(transition_response(order))
}

/// Any non-terminal state -> CANCELLED. Status update and per-item stock
/// restore commit or roll back together.
pub async fn cancel_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido no encontrado".into()))?;

    let current = parse_status(&order)?;
    if !current.can_transition_to(OrderStatus::Cancelled) {
        return Err(AppError::Conflict(format!(
            "No se puede cancelar un pedido en estado {}",
            current.as_str()
        )));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    for item in &items {
        let mut restored = false;
        if let (Some(color), Some(size)) = (item.color.as_deref(), item.size.as_deref()) {
            let result = ProductVariants::update_many()
                .col_expr(
                    VariantCol::Stock,
                    Expr::col(VariantCol::Stock).add(item.quantity),
                )
                .filter(VariantCol::ProductId.eq(item.product_id))
                .filter(VariantCol::Color.eq(color))
                .filter(VariantCol::Size.eq(size))
                .exec(&txn)
                .await?;
            restored = result.rows_affected > 0;
        }
        if !restored {
            Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
                .filter(ProdCol::Id.eq(item.product_id))
                .exec(&txn)
                .await?;
        }
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit_transition(state, &order, "order_cancel").await;

    state
        .mailer
        .send_best_effort(
            &order.customer_email,
            "Tu pedido fue cancelado",
            &format!("Tu pedido {} fue cancelado y el stock fue repuesto.", order.id),
        )
        .await;

    Ok(transition_response(order))
}

/// Customer-submitted transfer proof: WAITING_TRANSFER_PROOF -> PAYMENT_REVIEW.
pub async fn confirm_transfer(
    state: &AppState,
    id: Uuid,
    payload: TransferProofRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.sender_name.trim().is_empty() || payload.transaction_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Faltan datos del comprobante de transferencia".into(),
        ));
    }

    let order = load_order(&state.orm, id).await?;
    require_status(&order, OrderStatus::WaitingTransferProof)?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::PaymentReview.as_str().to_string());
    active.transfer_sender = Set(Some(payload.sender_name));
    active.transfer_tx_id = Set(Some(payload.transaction_id));
    active.transfer_sent_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit_transition(state, &order, "order_confirm_transfer").await;

    Ok(transition_response(order))
}

/// PAYMENT_REVIEW -> PROCESSED, after manually checking the transfer proof.
pub async fn approve_transfer(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    require_status(&order, OrderStatus::PaymentReview)?;

    let order = set_status(&state.orm, order, OrderStatus::Processed).await?;
    audit_transition(state, &order, "order_approve_transfer").await;

    state
        .mailer
        .send_best_effort(
            &order.customer_email,
            "Pago confirmado",
            &format!("Confirmamos el pago de tu pedido {}.", order.id),
        )
        .await;

    Ok(transition_response(order))
}

/// Registers the outbound shipment at the carrier and stores the returned
/// tracking number. Only PROCESSED orders without one.
pub async fn register_shipment(
    state: &AppState,
    id: Uuid,
    payload: RegisterShipmentRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = load_order(&state.orm, id).await?;
    require_status(&order, OrderStatus::Processed)?;
    if order.tracking_number.is_some() {
        return Err(AppError::Conflict(
            "El pedido ya tiene un número de seguimiento".into(),
        ));
    }

    let request = ImportShipmentRequest {
        customer_id: state.carrier.customer_id.clone(),
        seller_name: "Tienda".into(),
        recipient_name: order.customer_name.clone(),
        recipient_email: order.customer_email.clone(),
        address: order.shipping_address.clone().unwrap_or_default(),
        postal_code: order.postal_code.clone().unwrap_or_default(),
        weight_grams: payload.weight_grams.unwrap_or(1000),
    };

    let response = state.carrier.import_shipment(&request).await;
    let Some(data) = response.data else {
        let message = response
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "carrier import failed".into());
        return Err(AppError::external("carrier", message));
    };

    let mut active: OrderActive = order.into();
    active.tracking_number = Set(Some(data.tracking_number.clone()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        "order_shipment_registered",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "tracking_number": data.tracking_number })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(transition_response(order))
}

/// Webhook entry point: applies the processor's verdict through the same
/// transition table as the manual endpoints.
pub async fn apply_payment_status(
    state: &AppState,
    order_id: Uuid,
    status: PaymentStatus,
) -> AppResult<bool> {
    let order = load_order(&state.orm, order_id).await?;
    let current = parse_status(&order)?;

    match status {
        PaymentStatus::Paid => {
            // Approved payments may arrive while the order is still PENDING;
            // walk both edges rather than skipping a state.
            let order = if current == OrderStatus::Pending {
                set_status(&state.orm, order, OrderStatus::PendingPayment).await?
            } else {
                order
            };
            let current = parse_status(&order)?;
            if current != OrderStatus::PendingPayment {
                tracing::info!(order_id = %order.id, status = %order.status, "payment approved for order not awaiting payment, ignoring");
                return Ok(false);
            }
            let order = set_status(&state.orm, order, OrderStatus::Processed).await?;
            audit_transition(state, &order, "order_payment_approved").await;
            Ok(true)
        }
        PaymentStatus::Pending => {
            if current == OrderStatus::Pending {
                let order = set_status(&state.orm, order, OrderStatus::PendingPayment).await?;
                audit_transition(state, &order, "order_payment_pending").await;
                return Ok(true);
            }
            Ok(false)
        }
        PaymentStatus::Failed => {
            if current.is_terminal() {
                return Ok(false);
            }
            cancel_order(state, order_id).await?;
            Ok(true)
        }
    }
}

async fn load_order(orm: &crate::db::OrmConn, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Pedido no encontrado".into()))
}

fn parse_status(order: &OrderModel) -> AppResult<OrderStatus> {
    OrderStatus::parse(&order.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} carries unknown status {}",
            order.id,
            order.status
        ))
    })
}

/// Precondition check for single-predecessor transitions; the Conflict message
/// names both the required and the actual state.
fn require_status(order: &OrderModel, expected: OrderStatus) -> AppResult<()> {
    let current = parse_status(order)?;
    if current != expected {
        return Err(AppError::Conflict(format!(
            "El pedido debe estar en {} (estado actual: {})",
            expected.as_str(),
            current.as_str()
        )));
    }
    Ok(())
}

async fn set_status(
    orm: &crate::db::OrmConn,
    order: OrderModel,
    next: OrderStatus,
) -> AppResult<OrderModel> {
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(orm).await?)
}

async fn audit_transition(state: &AppState, order: &OrderModel, action: &str) {
    if let Err(err) = log_audit(
        &state.pool,
        action,
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

fn transition_response(order: OrderModel) -> ApiResponse<Order> {
    ApiResponse::success(
        "Pedido actualizado",
        order_from_entity(order),
        Some(Meta::empty()),
    )
}
