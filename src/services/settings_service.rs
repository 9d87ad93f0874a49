use serde_json::{Value, json};

use crate::{
    dto::settings::SettingValue,
    error::{AppError, AppResult},
    models::ShippingOption,
    response::{ApiResponse, Meta},
    state::AppState,
};

const KNOWN_KEYS: [&str; 4] = ["store", "contact", "home", "shipping_options"];

/// Built-in fallbacks for the CMS-style settings blobs. A missing row never
/// breaks the storefront.
fn default_for(key: &str) -> Option<Value> {
    match key {
        "store" => Some(json!({
            "name": "Tienda",
            "currency": "ARS",
            "vacation_banner": false,
        })),
        "contact" => Some(json!({
            "email": "hola@tienda.example",
            "phone": null,
            "instagram": null,
        })),
        "home" => Some(json!({
            "headline": "Bienvenidos",
            "featured_product_ids": [],
        })),
        "shipping_options" => Some(json!(default_shipping_options())),
        _ => None,
    }
}

pub fn default_shipping_options() -> Vec<ShippingOption> {
    vec![
        ShippingOption {
            id: "pickup".into(),
            name: "Retiro en sucursal".into(),
            price: 0,
            estimated_days: "24-72 hs".into(),
        },
        ShippingOption {
            id: "standard".into(),
            name: "Envío estándar".into(),
            price: 250_000,
            estimated_days: "2-5 días hábiles".into(),
        },
        ShippingOption {
            id: "express".into(),
            name: "Envío expreso".into(),
            price: 450_000,
            estimated_days: "24-48 hs".into(),
        },
    ]
}

pub async fn get_setting(state: &AppState, key: &str) -> AppResult<ApiResponse<SettingValue>> {
    let row: Option<(Value,)> = sqlx::query_as("SELECT value FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(&state.pool)
        .await?;

    let (value, stored) = match row {
        Some((value,)) => (value, true),
        None => match default_for(key) {
            Some(value) => (value, false),
            None => {
                return Err(AppError::NotFound(format!(
                    "Configuración desconocida: {key}"
                )));
            }
        },
    };

    Ok(ApiResponse::success(
        "Configuración",
        SettingValue {
            key: key.to_string(),
            value,
            stored,
        },
        Some(Meta::empty()),
    ))
}

pub async fn upsert_setting(
    state: &AppState,
    key: &str,
    value: Value,
) -> AppResult<ApiResponse<SettingValue>> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(AppError::Validation(format!(
            "Configuración desconocida: {key}"
        )));
    }

    let (stored,): (Value,) = sqlx::query_as(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
        RETURNING value
        "#,
    )
    .bind(key)
    .bind(value)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Configuración guardada",
        SettingValue {
            key: key.to_string(),
            value: stored,
            stored: true,
        },
        Some(Meta::empty()),
    ))
}

/// Shipping options shown at checkout: the stored setting when present and
/// parseable, the hard-coded defaults otherwise.
pub async fn shipping_options(state: &AppState) -> AppResult<Vec<ShippingOption>> {
    let row: Option<(Value,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'shipping_options'")
            .fetch_optional(&state.pool)
            .await?;

    let options = match row {
        Some((value,)) => serde_json::from_value(value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "stored shipping_options is malformed, using defaults");
            default_shipping_options()
        }),
        None => default_shipping_options(),
    };
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_key_has_a_default() {
        for key in KNOWN_KEYS {
            assert!(default_for(key).is_some(), "{key}");
        }
        assert!(default_for("nope").is_none());
    }

    #[test]
    fn default_shipping_options_include_free_pickup() {
        let options = default_shipping_options();
        let pickup = options.iter().find(|o| o.id == "pickup").unwrap();
        assert_eq!(pickup.price, 0);
        assert!(options.len() >= 2);
    }
}
