// src/db/queries/notification.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
};
use chrono::Utc;
use sqlx::{PgPool, QueryBuilder};

use crate::db::models::notification::{Notification, NotificationFilter};
use crate::middleware::auth::Claims;
use crate::utils::api_response::ApiResponse;

#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationFilter),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = Vec<Notification>),
        (status = 500, description = "Failed to retrieve notifications")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn list_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<NotificationFilter>,
) -> Result<ApiResponse<Vec<Notification>>, ApiResponse<()>> {
    let mut qb = QueryBuilder::new(
        "SELECT id, recipient_email, title, body, request_id, created_at, read_at \
         FROM notifications WHERE lower(recipient_email) = lower(",
    );
    qb.push_bind(&claims.email).push(")");

    if filter.unread_only.unwrap_or(false) {
        qb.push(" AND read_at IS NULL");
    }

    qb.push(" ORDER BY created_at DESC");
    qb.push(" LIMIT ")
        .push_bind(i64::from(filter.limit.unwrap_or(50).min(200)));
    qb.push(" OFFSET ")
        .push_bind(i64::from(filter.offset.unwrap_or(0)));

    let notifications: Vec<Notification> = qb
        .build_query_as()
        .fetch_all(&pool)
        .await
        .map_err(|e| ApiResponse::database_error("Failed to retrieve notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notifications retrieved",
        notifications,
    ))
}

#[utoipa::path(
    post,
    path = "/notifications/{notification_id}/read",
    params(
        ("notification_id" = i32, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found or not addressed to the caller")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn mark_notification_read(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<i32>,
) -> Result<ApiResponse<Notification>, ApiResponse<()>> {
    let updated: Option<Notification> = sqlx::query_as(
        r#"
        UPDATE notifications
        SET read_at = $1
        WHERE id = $2 AND lower(recipient_email) = lower($3) AND read_at IS NULL
        RETURNING id, recipient_email, title, body, request_id, created_at, read_at
        "#,
    )
    .bind(Utc::now().naive_utc())
    .bind(notification_id)
    .bind(&claims.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::database_error("Failed to update notification", e))?;

    match updated {
        Some(notification) => Ok(ApiResponse::success(
            StatusCode::OK,
            "Notification marked read",
            notification,
        )),
        None => Err(ApiResponse::<()>::error(
            StatusCode::NOT_FOUND,
            "Notification not found",
            None,
        )),
    }
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(list_notifications, mark_notification_read),
    components(schemas(Notification)),
    tags(
        (name = "Notifications", description = "Per-recipient notification rows written by lifecycle transitions")
    )
)]
pub struct NotificationDoc;
