pub mod admin;
pub mod notification;
pub mod request;
pub mod stock;
