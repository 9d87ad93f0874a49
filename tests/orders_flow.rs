use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use tienda_api::{
    carrier::CarrierClient,
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{CreateOrderRequest, OrderItemInput, TransferProofRequest},
    entity::{
        orders::ActiveModel as OrderActive,
        product_variants::{ActiveModel as VariantActive, Entity as ProductVariants},
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    error::AppError,
    mailer::Mailer,
    models::OrderStatus,
    payments::{PaymentStatus, PaymentsClient},
    services::{checkout_service, order_service, product_service, tracking_service},
    state::AppState,
};
use uuid::Uuid;

// Integration flow: checkout against variant stock -> transfer proof path to
// delivered; then a flat-stock order through the webhook verdict and a cancel
// that restores stock.
#[tokio::test]
async fn checkout_transfer_and_cancel_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Seed a product whose stock lives on variants
    let shirt = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Remera test".into()),
        description: Set(None),
        price: Set(150_000),
        sale_price: Set(None),
        on_sale: Set(false),
        stock: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(shirt.id),
        color: Set("negro".into()),
        size: Set("M".into()),
        stock: Set(5),
    }
    .insert(&state.orm)
    .await?;

    // Pre-transaction validation pass: unknown products are caught before
    // anything is written
    let err = checkout_service::validate_stock(
        &state.orm,
        &[OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
            color: None,
            size: None,
        }],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    checkout_service::validate_stock(
        &state.orm,
        &[OrderItemInput {
            product_id: shirt.id,
            quantity: 2,
            color: Some("negro".into()),
            size: Some("M".into()),
        }],
    )
    .await?;

    // A negative shipping price cannot discount the order
    let err = checkout_service::create_order(
        &state,
        CreateOrderRequest {
            customer_name: "Ana".into(),
            customer_email: "ana@example.com".into(),
            customer_phone: None,
            shipping_address: None,
            postal_code: None,
            payment_method: "bank_transfer".into(),
            shipping_price: Some(-10_000),
            items: vec![OrderItemInput {
                product_id: shirt.id,
                quantity: 1,
                color: Some("negro".into()),
                size: Some("M".into()),
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Bank transfer checkout
    let created = checkout_service::create_order(
        &state,
        CreateOrderRequest {
            customer_name: "Ana".into(),
            customer_email: "ana@example.com".into(),
            customer_phone: None,
            shipping_address: Some("Av. Siempre Viva 123".into()),
            postal_code: Some("1050".into()),
            payment_method: "bank_transfer".into(),
            shipping_price: Some(50_000),
            items: vec![OrderItemInput {
                product_id: shirt.id,
                quantity: 2,
                color: Some("negro".into()),
                size: Some("M".into()),
            }],
        },
    )
    .await?;
    let order = created.data.expect("order payload").order;
    assert_eq!(order.total, 50_000 + 2 * 150_000);
    assert_eq!(order.status, OrderStatus::WaitingTransferProof);

    let variant_after = ProductVariants::find_by_id(variant.id)
        .one(&state.orm)
        .await?
        .expect("variant");
    assert_eq!(variant_after.stock, 3, "variant stock decremented");

    // Wrong predecessor: a transfer order is not awaiting online payment
    let err = order_service::mark_processed(&state, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Transfer proof path: review, approve, deliver
    order_service::confirm_transfer(
        &state,
        order.id,
        TransferProofRequest {
            sender_name: "Ana G".into(),
            transaction_id: "TX-123".into(),
        },
    )
    .await?;

    let approved = order_service::approve_transfer(&state, order.id).await?;
    assert_eq!(approved.data.expect("order").status, OrderStatus::Processed);

    let delivered = order_service::mark_delivered(&state, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.estimated_delivery.is_some());

    // Terminal orders cannot be cancelled
    let err = order_service::cancel_order(&state, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Flat-stock order paid through the processor, then cancelled
    let mug = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Taza test".into()),
        description: Set(None),
        price: Set(65_000),
        sale_price: Set(Some(60_000)),
        on_sale: Set(true),
        stock: Set(10),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let created = checkout_service::create_order(
        &state,
        CreateOrderRequest {
            customer_name: "Bruno".into(),
            customer_email: "bruno@example.com".into(),
            customer_phone: None,
            shipping_address: None,
            postal_code: None,
            payment_method: "mercado_pago".into(),
            shipping_price: None,
            items: vec![OrderItemInput {
                product_id: mug.id,
                quantity: 3,
                color: None,
                size: None,
            }],
        },
    )
    .await?;
    let paid_order = created.data.expect("order payload").order;
    // Sale price applies
    assert_eq!(paid_order.total, 3 * 60_000);
    assert_eq!(paid_order.status, OrderStatus::Pending);

    let applied =
        order_service::apply_payment_status(&state, paid_order.id, PaymentStatus::Paid).await?;
    assert!(applied);
    let fetched = order_service::get_order(&state, paid_order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.order.status, OrderStatus::Processed);

    // Oversell is rejected with the remaining quantity in the message
    let err = checkout_service::create_order(
        &state,
        CreateOrderRequest {
            customer_name: "Carla".into(),
            customer_email: "carla@example.com".into(),
            customer_phone: None,
            shipping_address: None,
            postal_code: None,
            payment_method: "mercado_pago".into(),
            shipping_price: None,
            items: vec![OrderItemInput {
                product_id: mug.id,
                quantity: 8,
                color: None,
                size: None,
            }],
        },
    )
    .await
    .unwrap_err();
    match err {
        AppError::InsufficientStock(msg) => assert!(msg.contains('7'), "{msg}"),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Cancel restores the three units exactly once
    order_service::cancel_order(&state, paid_order.id).await?;
    let mug_after = Products::find_by_id(mug.id)
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(mug_after.stock, 10);

    let err = order_service::cancel_order(&state, paid_order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    let mug_after = Products::find_by_id(mug.id)
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(mug_after.stock, 10, "stock restored only once");

    // Catalog aggregates count variant stock alongside the flat counters
    let stats = product_service::catalog_stats(&state)
        .await?
        .data
        .expect("stats");
    assert_eq!(stats.products, 2);
    assert_eq!(stats.units_in_stock, 3 + 10);
    assert_eq!(stats.out_of_stock, 0);
    assert_eq!(stats.on_sale, 1);

    // An unreachable carrier marks the order as failed; the sweep still
    // finishes and reports the tally
    OrderActive {
        id: Set(Uuid::new_v4()),
        customer_name: Set("Diego".into()),
        customer_email: Set("diego@example.com".into()),
        customer_phone: Set(None),
        shipping_address: Set(None),
        postal_code: Set(None),
        status: Set(OrderStatus::Processed.as_str().to_string()),
        total: Set(100_000),
        payment_method: Set("mercado_pago".into()),
        tracking_number: Set(Some("CA000000001AR".into())),
        last_tracking_event: Set(None),
        transfer_sender: Set(None),
        transfer_tx_id: Set(None),
        transfer_sent_at: Set(None),
        estimated_delivery: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let summary = tracking_service::run_sweep(&state).await?;
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.updated, 0);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, product_variants, products, settings, vacation_subscribers, vacation_periods, audit_logs RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = test_config(database_url);
    Ok(AppState {
        pool,
        orm,
        carrier: CarrierClient::new(&config),
        payments: PaymentsClient::new(&config),
        mailer: Mailer::new(&config),
        config,
    })
}

// No external credentials: the mailer short-circuits without an API key and
// neither the carrier nor the processor is reached by this flow.
fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        carrier_base_url: "http://localhost:9".into(),
        carrier_user: String::new(),
        carrier_password: String::new(),
        carrier_customer_id: String::new(),
        mp_base_url: "http://localhost:9".into(),
        mp_access_token: String::new(),
        mp_webhook_secret: None,
        cron_secret: "test".into(),
        email_api_url: "http://localhost:9".into(),
        email_api_key: None,
        email_from: "test@example.com".into(),
    }
}
