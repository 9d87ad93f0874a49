use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        CatalogStats, CreateProductRequest, ProductList, ProductWithVariants,
        UpdateProductRequest,
    },
    entity::{
        product_variants::{
            ActiveModel as VariantActive, Column as VariantCol, Entity as ProductVariants,
            Model as VariantModel,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Product, Variant},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    routes::products::InventoryAdjustRequest,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(on_sale) = query.on_sale {
        condition = condition.add(Column::OnSale.eq(on_sale));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Productos",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".into()))?;

    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(variant_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Producto",
        ProductWithVariants {
            product: product_from_entity(product),
            variants,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    if payload.price < 0 || payload.stock < 0 {
        return Err(AppError::Validation(
            "Precio y stock deben ser positivos".into(),
        ));
    }

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        sale_price: Set(payload.sale_price),
        on_sale: Set(payload.on_sale),
        stock: Set(payload.stock),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    let mut variants = Vec::new();
    for variant in payload.variants {
        let inserted = VariantActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            color: Set(variant.color),
            size: Set(variant.size),
            stock: Set(variant.stock),
        }
        .insert(&state.orm)
        .await?;
        variants.push(variant_from_entity(inserted));
    }

    if let Err(err) = log_audit(
        &state.pool,
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Producto creado",
        ProductWithVariants {
            product: product_from_entity(product),
            variants,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".into()))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(sale_price) = payload.sale_price {
        active.sale_price = Set(Some(sale_price));
    }
    if let Some(on_sale) = payload.on_sale {
        active.on_sale = Set(on_sale);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Producto actualizado",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Producto no encontrado".into()));
    }

    if let Err(err) = log_audit(
        &state.pool,
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Producto eliminado",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.delta == 0 {
        return Err(AppError::Validation("delta no puede ser 0".into()));
    }

    use sea_orm::TransactionTrait;
    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".into()))?;

    let new_stock = product.stock + payload.delta;
    if new_stock < 0 {
        return Err(AppError::Validation(
            "El stock no puede quedar negativo".into(),
        ));
    }

    let mut active: ActiveModel = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        "inventory_adjust",
        Some("products"),
        Some(serde_json::json!({ "product_id": updated.id, "delta": payload.delta })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Inventario actualizado",
        product_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn catalog_stats(state: &AppState) -> AppResult<ApiResponse<CatalogStats>> {
    let row: (i64, Option<i64>, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            SUM(p.stock + COALESCE(v.variant_stock, 0))::BIGINT,
            COUNT(*) FILTER (WHERE p.stock = 0 AND COALESCE(v.variant_stock, 0) = 0),
            COUNT(*) FILTER (WHERE p.on_sale)
        FROM products p
        LEFT JOIN (
            SELECT product_id, SUM(stock) AS variant_stock
            FROM product_variants
            GROUP BY product_id
        ) v ON v.product_id = p.id
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let stats = CatalogStats {
        products: row.0,
        units_in_stock: row.1.unwrap_or(0),
        out_of_stock: row.2,
        on_sale: row.3,
    };
    Ok(ApiResponse::success("Estadísticas", stats, Some(Meta::empty())))
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        sale_price: model.sale_price,
        on_sale: model.on_sale,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn variant_from_entity(model: VariantModel) -> Variant {
    Variant {
        id: model.id,
        product_id: model.product_id,
        color: model.color,
        size: model.size,
        stock: model.stock,
    }
}
