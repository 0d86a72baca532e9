pub mod admin;
pub mod health;
pub mod notification;
pub mod request;
