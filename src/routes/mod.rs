use axum::Router;

use crate::state::AppState;

pub mod cron;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod settings;
pub mod shipping;
pub mod vacation;
pub mod webhooks;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/shipping", shipping::router())
        .nest("/settings", settings::router())
        .nest("/vacation", vacation::router())
        .nest("/webhooks", webhooks::router())
        .nest("/cron", cron::router())
}
