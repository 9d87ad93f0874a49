pub mod checkout_service;
pub mod order_service;
pub mod product_service;
pub mod settings_service;
pub mod shipping_service;
pub mod tracking_service;
pub mod vacation_service;
