use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderItemInput, OrderWithItems},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        product_variants::{
            Column as VariantCol, Entity as ProductVariants, Model as VariantModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Per-line stock check. Variant-scoped when the product has variants and the
/// line carries both selectors; flat product stock otherwise. Pure.
pub fn check_line(
    product: &ProductModel,
    variants: &[VariantModel],
    line: &OrderItemInput,
) -> AppResult<()> {
    if line.quantity <= 0 {
        return Err(AppError::Validation(format!(
            "Cantidad inválida para {}",
            product.name
        )));
    }

    if !variants.is_empty()
        && let (Some(color), Some(size)) = (line.color.as_deref(), line.size.as_deref())
    {
        let variant = variants
            .iter()
            .find(|v| v.color == color && v.size == size)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Variante {color}/{size} no encontrada para {}",
                    product.name
                ))
            })?;
        if variant.stock < line.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Stock insuficiente para {} ({color}/{size}): disponible {}",
                product.name, variant.stock
            )));
        }
        return Ok(());
    }

    if product.stock < line.quantity {
        return Err(AppError::InsufficientStock(format!(
            "Stock insuficiente para {}: disponible {}",
            product.name, product.stock
        )));
    }
    Ok(())
}

/// Validation-only pass over a cart. No side effects; runs once per checkout
/// attempt before anything is written.
pub async fn validate_stock<C: sea_orm::ConnectionTrait>(
    conn: &C,
    lines: &[OrderItemInput],
) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::Validation("El carrito está vacío".into()));
    }

    let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(ids.clone()))
        .all(conn)
        .await?;
    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.is_in(ids))
        .all(conn)
        .await?;

    for line in lines {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Producto no encontrado: {}", line.product_id))
            })?;
        let product_variants: Vec<VariantModel> = variants
            .iter()
            .filter(|v| v.product_id == product.id)
            .cloned()
            .collect();
        check_line(product, &product_variants, line)?;
    }

    Ok(())
}

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::Validation("Falta el nombre del cliente".into()));
    }
    if !payload.customer_email.contains('@') {
        return Err(AppError::Validation("Email inválido".into()));
    }
    if payload.shipping_price.is_some_and(|price| price < 0) {
        return Err(AppError::Validation(
            "El costo de envío no puede ser negativo".into(),
        ));
    }

    validate_stock(&state.orm, &payload.items).await?;

    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = payload.items.iter().map(|l| l.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(ids.clone()))
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.is_in(ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let mut total: i64 = payload.shipping_price.unwrap_or(0);
    for line in &payload.items {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Producto no encontrado: {}", line.product_id))
            })?;
        let product_variants: Vec<VariantModel> = variants
            .iter()
            .filter(|v| v.product_id == product.id)
            .cloned()
            .collect();
        check_line(product, &product_variants, line)?;
        total += effective_price(product) * (line.quantity as i64);
    }

    let initial_status = if payload.payment_method == "bank_transfer" {
        OrderStatus::WaitingTransferProof
    } else {
        OrderStatus::Pending
    };

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        customer_name: Set(payload.customer_name),
        customer_email: Set(payload.customer_email),
        customer_phone: Set(payload.customer_phone),
        shipping_address: Set(payload.shipping_address),
        postal_code: Set(payload.postal_code),
        status: Set(initial_status.as_str().to_string()),
        total: Set(total),
        payment_method: Set(payload.payment_method),
        tracking_number: Set(None),
        last_tracking_event: Set(None),
        transfer_sender: Set(None),
        transfer_tx_id: Set(None),
        transfer_sent_at: Set(None),
        estimated_delivery: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for line in &payload.items {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Producto no encontrado: {}", line.product_id))
            })?;

        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(effective_price(product)),
            color: Set(line.color.clone()),
            size: Set(line.size.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));

        decrement_stock(&txn, product, &variants, line).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    state
        .mailer
        .send_best_effort(
            &order.customer_email,
            "Recibimos tu pedido",
            &format!("Tu pedido {} fue registrado. Total: ${}.", order.id, total),
        )
        .await;

    Ok(ApiResponse::success(
        "Pedido creado",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Atomic floor-checked decrement; zero rows affected means someone took the
/// stock between validation and here, so the whole order rolls back.
async fn decrement_stock(
    txn: &sea_orm::DatabaseTransaction,
    product: &ProductModel,
    variants: &[VariantModel],
    line: &OrderItemInput,
) -> AppResult<()> {
    let variant_scoped = if let (Some(color), Some(size)) =
        (line.color.as_deref(), line.size.as_deref())
    {
        variants
            .iter()
            .find(|v| v.product_id == product.id && v.color == color && v.size == size)
    } else {
        None
    };

    let result = if let Some(variant) = variant_scoped {
        ProductVariants::update_many()
            .col_expr(
                VariantCol::Stock,
                Expr::col(VariantCol::Stock).sub(line.quantity),
            )
            .filter(VariantCol::Id.eq(variant.id))
            .filter(VariantCol::Stock.gte(line.quantity))
            .exec(txn)
            .await?
    } else {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .filter(ProdCol::Stock.gte(line.quantity))
            .exec(txn)
            .await?
    };

    if result.rows_affected == 0 {
        return Err(AppError::InsufficientStock(format!(
            "Stock insuficiente para {}",
            product.name
        )));
    }
    Ok(())
}

fn effective_price(product: &ProductModel) -> i64 {
    if product.on_sale {
        product.sale_price.unwrap_or(product.price)
    } else {
        product.price
    }
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        shipping_address: model.shipping_address,
        postal_code: model.postal_code,
        status: OrderStatus::parse(&model.status).unwrap_or(OrderStatus::Pending),
        total: model.total,
        payment_method: model.payment_method,
        tracking_number: model.tracking_number,
        last_tracking_event: model.last_tracking_event,
        transfer_sender: model.transfer_sender,
        transfer_tx_id: model.transfer_tx_id,
        transfer_sent_at: model.transfer_sent_at.map(|dt| dt.with_timezone(&Utc)),
        estimated_delivery: model.estimated_delivery.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        color: model.color,
        size: model.size,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::prelude::DateTimeWithTimeZone;

    fn product(stock: i32) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: "Remera lisa".into(),
            description: None,
            price: 150_000,
            sale_price: None,
            on_sale: false,
            stock,
            created_at: DateTimeWithTimeZone::from(chrono::Utc::now()),
        }
    }

    fn variant(product_id: Uuid, color: &str, size: &str, stock: i32) -> VariantModel {
        VariantModel {
            id: Uuid::new_v4(),
            product_id,
            color: color.into(),
            size: size.into(),
            stock,
        }
    }

    fn line(product_id: Uuid, quantity: i32, color: Option<&str>, size: Option<&str>) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            color: color.map(Into::into),
            size: size.map(Into::into),
        }
    }

    #[test]
    fn flat_stock_line_within_stock_passes() {
        let p = product(5);
        assert!(check_line(&p, &[], &line(p.id, 5, None, None)).is_ok());
    }

    #[test]
    fn flat_stock_shortage_names_product_and_available_quantity() {
        let p = product(2);
        let err = check_line(&p, &[], &line(p.id, 3, None, None)).unwrap_err();
        match err {
            AppError::InsufficientStock(msg) => {
                assert!(msg.contains("Stock insuficiente"), "{msg}");
                assert!(msg.contains("Remera lisa"), "{msg}");
                assert!(msg.contains('2'), "{msg}");
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn variant_line_checks_variant_stock_not_product_stock() {
        let p = product(0);
        let vs = vec![variant(p.id, "negro", "M", 4)];
        assert!(check_line(&p, &vs, &line(p.id, 4, Some("negro"), Some("M"))).is_ok());

        let err = check_line(&p, &vs, &line(p.id, 5, Some("negro"), Some("M"))).unwrap_err();
        match err {
            AppError::InsufficientStock(msg) => {
                assert!(msg.contains("negro/M"), "{msg}");
                assert!(msg.contains('4'), "{msg}");
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn unknown_variant_combination_is_not_found() {
        let p = product(10);
        let vs = vec![variant(p.id, "negro", "M", 4)];
        let err = check_line(&p, &vs, &line(p.id, 1, Some("rojo"), Some("M"))).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn incomplete_selector_falls_back_to_flat_stock() {
        let p = product(1);
        let vs = vec![variant(p.id, "negro", "M", 0)];
        // Only a color, no size: flat counter applies.
        assert!(check_line(&p, &vs, &line(p.id, 1, Some("negro"), None)).is_ok());
    }

    #[test]
    fn non_positive_quantity_rejected() {
        let p = product(10);
        assert!(matches!(
            check_line(&p, &[], &line(p.id, 0, None, None)),
            Err(AppError::Validation(_))
        ));
    }
}
