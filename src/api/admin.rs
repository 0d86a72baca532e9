use axum::{routing::get, Router};
use sqlx::PgPool;

use crate::db::queries::admin::{get_recommended_admin, list_admins};

pub fn admin_routes() -> Router<PgPool> {
    Router::new()
        .route("/admins", get(list_admins))
        .route("/admins/recommended", get(get_recommended_admin))
}
