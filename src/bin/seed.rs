use tienda_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_products(&pool).await?;
    seed_settings(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("Remera clásica", "Remera de algodón peinado", 1_200_000, 0, true),
        ("Buzo canguro", "Buzo frisado con capucha", 2_800_000, 0, true),
        ("Taza esmaltada", "Taza de chapa esmaltada", 650_000, 40, false),
        ("Tote bag", "Bolsa de lona estampada", 450_000, 60, false),
    ];

    for (name, desc, price, stock, with_variants) in products {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .fetch_optional(pool)
        .await?;

        if with_variants && let Some((product_id,)) = row {
            seed_variants(pool, product_id).await?;
        }
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_variants(pool: &sqlx::PgPool, product_id: Uuid) -> anyhow::Result<()> {
    for color in ["negro", "blanco"] {
        for size in ["S", "M", "L", "XL"] {
            sqlx::query(
                r#"
                INSERT INTO product_variants (id, product_id, color, size, stock)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (product_id, color, size) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(color)
            .bind(size)
            .bind(10)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let store = serde_json::json!({
        "name": "Tienda",
        "currency": "ARS",
        "vacation_mode": false
    });

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES ('store', $1)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(store)
    .execute(pool)
    .await?;

    println!("Seeded settings");
    Ok(())
}
