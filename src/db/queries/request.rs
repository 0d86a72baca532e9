// src/db/queries/request.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::db::models::request::{
    DecisionAction, DecisionBody, FacilityRequest, FacilityType, NewFacilityRequest,
    RequestFilter, RequestPayload, RequestStatus, ResolutionBody,
};
use crate::db::queries::admin::get_admin_cached;
use crate::db::queries::stock::{decrement_stock, get_stock_map};
use crate::middleware::auth::{AdminCache, Claims};
use crate::utils::api_response::ApiResponse;
use crate::utils::notification::NotificationBuilder;
use crate::validation::{resolve_order_prices, validate_payload};
use crate::workflow::{self, LifecycleState, WorkflowError};

const REQUEST_COLUMNS: &str = "id, facility_type, requested_by, requester_email, \
     faculty_approver_email, payload, status, forwarded_to_admin_id, decided_by, \
     resolved_by, created_at, decided_at";

fn lifecycle_of(request: &FacilityRequest) -> LifecycleState {
    LifecycleState {
        status: request.status,
        forwarded_to_admin_id: request.forwarded_to_admin_id,
        decided_by: request.decided_by,
        decided_at: request.decided_at,
        resolved_by: request.resolved_by,
    }
}

async fn send_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    builder: NotificationBuilder,
) -> Result<(), ApiResponse<()>> {
    builder.send(&mut **tx).await.map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create notification",
            Some(json!({ "error": e.to_string() })),
        )
    })
}

#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewFacilityRequest,
    responses(
        (status = 201, description = "Facility request submitted", body = FacilityRequest),
        (status = 400, description = "Payload failed validation"),
        (status = 409, description = "Identical request already pending"),
        (status = 500, description = "Failed to insert facility request")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<NewFacilityRequest>,
) -> Result<ApiResponse<FacilityRequest>, ApiResponse<()>> {
    let user_id = claims.user_id()?;
    let mut payload = body.payload;
    let facility_type = payload.facility_type();

    // Stationery quantities are capped by live stock; other facilities don't
    // need the table.
    let stock = if facility_type == FacilityType::Stationery {
        get_stock_map(&pool)
            .await
            .map_err(|e| ApiResponse::database_error("Failed to load stationery stock", e))?
    } else {
        Default::default()
    };

    let today = Utc::now().date_naive();
    let errors = validate_payload(&payload, &body.faculty_approver_email, today, &stock);
    if !errors.is_empty() {
        return Err(WorkflowError::Validation(errors).into());
    }

    // Price canteen order lines against the menu before the payload is
    // persisted; unmatched items keep price 0.
    if let RequestPayload::Canteen(order) = &mut payload {
        resolve_order_prices(order);
    }

    let payload_json = serde_json::to_value(&payload).map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to serialize payload",
            Some(json!({ "error": e.to_string() })),
        )
    })?;

    // Check for duplicates
    let duplicate_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM facility_requests
            WHERE facility_type = $1 AND requested_by = $2 AND payload = $3 AND status = 'pending'
        )
        "#,
    )
    .bind(facility_type)
    .bind(user_id)
    .bind(&payload_json)
    .fetch_one(&pool)
    .await
    .unwrap_or(false);

    if duplicate_exists {
        return Err(ApiResponse::<()>::error(
            StatusCode::CONFLICT,
            "Duplicate request already pending",
            None,
        ));
    }

    // Insert and notify the approver atomically
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::database_error("Failed to start transaction", e))?;

    let request: FacilityRequest = sqlx::query_as(&format!(
        r#"
        INSERT INTO facility_requests
            (id, facility_type, requested_by, requester_email, faculty_approver_email, payload)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(facility_type)
    .bind(user_id)
    .bind(&claims.email)
    .bind(body.faculty_approver_email.trim().to_lowercase())
    .bind(&payload_json)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiResponse::database_error("Failed to insert facility request", e))?;

    send_notification(
        &mut tx,
        NotificationBuilder::new(format!(
            "New {} request awaiting your review",
            facility_type.as_str()
        ))
        .body(format!("Submitted by {}", claims.username))
        .request(request.id)
        .recipient(&request.faculty_approver_email),
    )
    .await?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::database_error("Failed to commit transaction", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Facility request submitted",
        request,
    ))
}

pub async fn get_request_by_id(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<FacilityRequest, ApiResponse<()>> {
    sqlx::query_as(&format!(
        "SELECT {REQUEST_COLUMNS} FROM facility_requests WHERE id = $1"
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiResponse::database_error("Failed to fetch facility request", e))?
    .ok_or_else(|| {
        ApiResponse::<()>::error(StatusCode::NOT_FOUND, "Facility request not found", None)
    })
}

#[utoipa::path(
    get,
    path = "/requests/{request_id}",
    params(
        ("request_id" = Uuid, Path, description = "Facility request ID")
    ),
    responses(
        (status = 200, description = "Facility request retrieved", body = FacilityRequest),
        (status = 404, description = "Facility request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request_handler(
    State(pool): State<PgPool>,
    Path(request_id): Path<Uuid>,
) -> Result<ApiResponse<FacilityRequest>, ApiResponse<()>> {
    let request = get_request_by_id(&pool, request_id).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Facility request retrieved",
        request,
    ))
}

#[utoipa::path(
    get,
    path = "/requests",
    params(RequestFilter),
    responses(
        (status = 200, description = "Filtered facility requests, newest first", body = Vec<FacilityRequest>),
        (status = 500, description = "Failed to retrieve requests")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_requests(
    State(pool): State<PgPool>,
    Query(filter): Query<RequestFilter>,
) -> Result<ApiResponse<Vec<FacilityRequest>>, ApiResponse<()>> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {REQUEST_COLUMNS} FROM facility_requests WHERE 1=1"
    ));

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(facility_type) = filter.facility_type {
        qb.push(" AND facility_type = ").push_bind(facility_type);
    }
    if let Some(assignee) = filter.assignee {
        qb.push(" AND forwarded_to_admin_id = ").push_bind(assignee);
    }
    if let Some(requested_by) = filter.requested_by {
        qb.push(" AND requested_by = ").push_bind(requested_by);
    }

    qb.push(" ORDER BY created_at DESC");
    qb.push(" LIMIT ")
        .push_bind(i64::from(filter.limit.unwrap_or(100).min(500)));
    qb.push(" OFFSET ")
        .push_bind(i64::from(filter.offset.unwrap_or(0)));

    let requests: Vec<FacilityRequest> = qb
        .build_query_as()
        .fetch_all(&pool)
        .await
        .map_err(|e| ApiResponse::database_error("Failed to retrieve requests", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Facility requests retrieved",
        requests,
    ))
}

#[utoipa::path(
    patch,
    path = "/requests/{request_id}/decision",
    params(
        ("request_id" = Uuid, Path, description = "Facility request ID")
    ),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Decision recorded", body = FacilityRequest),
        (status = 400, description = "Missing forward target"),
        (status = 403, description = "Actor is not the nominated approver"),
        (status = 404, description = "Facility request not found"),
        (status = 409, description = "Request is no longer pending"),
        (status = 422, description = "Forward target not in an eligible admin pool")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn decide_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Extension(admin_cache): Extension<AdminCache>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<DecisionBody>,
) -> Result<ApiResponse<FacilityRequest>, ApiResponse<()>> {
    let reviewer_id = claims.user_id()?;
    let request = get_request_by_id(&pool, request_id).await?;

    if !claims.is_admin()
        && !claims
            .email
            .eq_ignore_ascii_case(&request.faculty_approver_email)
    {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only the nominated faculty approver can decide this request",
            None,
        ));
    }

    // Forwarding needs an eligible target before anything is written.
    let forward_target = if body.action == DecisionAction::Forward {
        let admin_id = body.admin_id.ok_or_else(|| {
            ApiResponse::<()>::error(
                StatusCode::BAD_REQUEST,
                "admin_id is required when forwarding",
                None,
            )
        })?;
        let admin = get_admin_cached(&pool, &admin_cache, admin_id).await?;
        workflow::check_forward_target(request.facility_type, admin.pool)
            .map_err(ApiResponse::from)?;
        Some(admin)
    } else {
        None
    };

    let record = workflow::record_decision(
        &lifecycle_of(&request),
        body.action,
        reviewer_id,
        forward_target.as_ref().map(|a| a.id),
        Utc::now().naive_utc(),
    )
    .map_err(ApiResponse::from)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::database_error("Failed to start transaction", e))?;

    // Guarded update: losing a race to another decider yields zero rows.
    let updated: Option<FacilityRequest> = sqlx::query_as(&format!(
        r#"
        UPDATE facility_requests
        SET status = $1, forwarded_to_admin_id = $2, decided_by = $3, decided_at = $4
        WHERE id = $5 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(record.status)
    .bind(record.forwarded_to_admin_id)
    .bind(record.decided_by)
    .bind(record.decided_at)
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| ApiResponse::database_error("Failed to update facility request", e))?;

    let Some(updated) = updated else {
        return Err(ApiResponse::<()>::error(
            StatusCode::CONFLICT,
            "Action failed, request was already decided",
            None,
        ));
    };

    if let Some(admin) = &forward_target {
        send_notification(
            &mut tx,
            NotificationBuilder::new(format!(
                "A {} request was forwarded to your queue",
                updated.facility_type.as_str()
            ))
            .body(format!("Forwarded by {}", claims.username))
            .request(updated.id)
            .recipient(&admin.email),
        )
        .await?;
    }

    send_notification(
        &mut tx,
        NotificationBuilder::new(format!(
            "Your {} request was {}",
            updated.facility_type.as_str(),
            updated.status.as_str()
        ))
        .body(format!("Decided by {}", claims.username))
        .request(updated.id)
        .recipient(&updated.requester_email),
    )
    .await?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::database_error("Failed to commit transaction", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Decision recorded",
        updated,
    ))
}

#[utoipa::path(
    patch,
    path = "/requests/{request_id}/resolution",
    params(
        ("request_id" = Uuid, Path, description = "Facility request ID")
    ),
    request_body = ResolutionBody,
    responses(
        (status = 200, description = "Resolution recorded", body = FacilityRequest),
        (status = 403, description = "Actor is not the assigned facility admin"),
        (status = 404, description = "Facility request not found"),
        (status = 409, description = "Request is not forwarded")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn resolve_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ResolutionBody>,
) -> Result<ApiResponse<FacilityRequest>, ApiResponse<()>> {
    let admin_id = claims.user_id()?;
    let request = get_request_by_id(&pool, request_id).await?;

    if !claims.is_admin() && request.forwarded_to_admin_id != Some(admin_id) {
        return Err(ApiResponse::<()>::error(
            StatusCode::FORBIDDEN,
            "Only the assigned facility admin can resolve this request",
            None,
        ));
    }

    let record = workflow::record_resolution(&lifecycle_of(&request), body.outcome, admin_id)
        .map_err(ApiResponse::from)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::database_error("Failed to start transaction", e))?;

    // decided_at stays at the forwarding timestamp; the assignment is
    // released so only forwarded requests carry one, and the guard makes
    // the resolution exclusive the same way the decision is.
    let updated: Option<FacilityRequest> = sqlx::query_as(&format!(
        r#"
        UPDATE facility_requests
        SET status = $1, forwarded_to_admin_id = NULL, resolved_by = $2
        WHERE id = $3 AND status = 'forwarded'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(record.status)
    .bind(record.resolved_by)
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| ApiResponse::database_error("Failed to update facility request", e))?;

    let Some(updated) = updated else {
        return Err(ApiResponse::<()>::error(
            StatusCode::CONFLICT,
            "Action failed, request was already resolved",
            None,
        ));
    };

    if updated.status == RequestStatus::Completed {
        handle_stationery_completion(&mut tx, &updated).await?;
    }

    send_notification(
        &mut tx,
        NotificationBuilder::new(format!(
            "Your {} request was {}",
            updated.facility_type.as_str(),
            updated.status.as_str()
        ))
        .body(format!("Resolved by {}", claims.username))
        .request(updated.id)
        .recipient(&updated.requester_email),
    )
    .await?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::database_error("Failed to commit transaction", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Resolution recorded",
        updated,
    ))
}

/// Completing a stationery request consumes the ordered stock in the same
/// transaction; running out between forward and completion is a conflict.
async fn handle_stationery_completion(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    request: &FacilityRequest,
) -> Result<(), ApiResponse<()>> {
    let RequestPayload::Stationery(payload) = request.typed_payload().map_err(|e| {
        ApiResponse::<()>::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Stored payload is not a valid stationery order",
            Some(json!({ "error": e.to_string() })),
        )
    })?
    else {
        return Ok(());
    };

    for line in &payload.items {
        let consumed = decrement_stock(&mut **tx, &line.item, line.quantity)
            .await
            .map_err(|e| ApiResponse::database_error("Failed to update stationery stock", e))?;
        if !consumed {
            return Err(ApiResponse::<()>::error(
                StatusCode::CONFLICT,
                format!("Insufficient stock to complete request: {}", line.item),
                None,
            ));
        }
    }

    Ok(())
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(
        submit_request,
        list_requests,
        get_request_handler,
        decide_request,
        resolve_request
    ),
    components(schemas(
        FacilityRequest,
        NewFacilityRequest,
        DecisionBody,
        ResolutionBody,
        RequestStatus,
        FacilityType
    )),
    tags(
        (name = "Requests", description = "Facility request lifecycle: submit, decide, resolve")
    )
)]
pub struct RequestDoc;
