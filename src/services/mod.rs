pub mod auth_service;
pub mod basket_service;
pub mod catalog_service;
pub mod contact_service;
pub mod order_service;
pub mod product_service;
