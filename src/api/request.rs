use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::request::{
    decide_request, get_request_handler, list_requests, resolve_request, submit_request,
};

pub fn request_routes() -> Router<PgPool> {
    Router::new()
        .route("/requests", post(submit_request))
        .route("/requests", get(list_requests))
        .route("/requests/{request_id}", get(get_request_handler))
        .route("/requests/{request_id}/decision", patch(decide_request))
        .route("/requests/{request_id}/resolution", patch(resolve_request))
}
