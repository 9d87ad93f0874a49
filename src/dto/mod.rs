pub mod orders;
pub mod products;
pub mod settings;
pub mod shipping;
pub mod webhooks;
