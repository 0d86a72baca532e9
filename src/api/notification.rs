use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::notification::{list_notifications, mark_notification_read};

pub fn notification_routes() -> Router<PgPool> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route(
            "/notifications/{notification_id}/read",
            post(mark_notification_read),
        )
}
