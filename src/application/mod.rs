pub mod auth_service;
pub mod order_service;
