pub mod address;
pub mod auth;
pub mod catalog;
pub mod notification;
pub mod order;
