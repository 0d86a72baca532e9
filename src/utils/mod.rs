pub mod api_response;
pub mod menu;
pub mod notification;
