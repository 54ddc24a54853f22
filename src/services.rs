pub mod address_service;
pub mod auth;
pub mod catalog_service;
pub mod image_store;
pub mod notification_service;
pub mod order_number;
pub mod order_service;
pub mod pricing;
pub mod push;
pub mod realtime;
