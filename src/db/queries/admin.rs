// src/db/queries/admin.rs
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use sqlx::PgPool;

use crate::db::models::admin::{AdminFilter, AdminPool, FacilityAdmin};
use crate::middleware::auth::AdminCache;
use crate::utils::api_response::ApiResponse;

const ADMIN_COLUMNS: &str = "id, username, email, pool";

/// Fetch an admin row through the moka cache; misses hit the database and
/// populate the cache for subsequent forward checks.
pub async fn get_admin_cached(
    pool: &PgPool,
    cache: &AdminCache,
    admin_id: i32,
) -> Result<FacilityAdmin, ApiResponse<()>> {
    if let Some(admin) = cache.get(&admin_id) {
        return Ok(admin);
    }

    let admin: FacilityAdmin = sqlx::query_as(&format!(
        "SELECT {ADMIN_COLUMNS} FROM facility_admins WHERE id = $1"
    ))
    .bind(admin_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiResponse::database_error("Failed to fetch facility admin", e))?
    .ok_or_else(|| {
        ApiResponse::<()>::error(StatusCode::NOT_FOUND, "Facility admin not found", None)
    })?;

    cache.insert(admin_id, admin.clone());
    Ok(admin)
}

#[utoipa::path(
    get,
    path = "/admins",
    params(AdminFilter),
    responses(
        (status = 200, description = "Facility admins; with facility_type set, the eligible forward targets for that facility", body = Vec<FacilityAdmin>),
        (status = 500, description = "Failed to retrieve admins")
    ),
    tag = "Admins",
    security(("bearerAuth" = []))
)]
pub async fn list_admins(
    State(pool): State<PgPool>,
    Query(filter): Query<AdminFilter>,
) -> Result<ApiResponse<Vec<FacilityAdmin>>, ApiResponse<()>> {
    let admins: Vec<FacilityAdmin> = match filter.facility_type {
        Some(facility) => {
            // The facility's own pool plus the generic department pool, i.e.
            // exactly the admins a forward may target.
            sqlx::query_as(&format!(
                "SELECT {ADMIN_COLUMNS} FROM facility_admins WHERE pool = $1 OR pool = $2 ORDER BY id"
            ))
            .bind(AdminPool::from(facility))
            .bind(AdminPool::Department)
            .fetch_all(&pool)
            .await
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {ADMIN_COLUMNS} FROM facility_admins ORDER BY id"
            ))
            .fetch_all(&pool)
            .await
        }
    }
    .map_err(|e| ApiResponse::database_error("Failed to retrieve admins", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Facility admins retrieved",
        admins,
    ))
}

#[utoipa::path(
    get,
    path = "/admins/recommended",
    params(AdminFilter),
    responses(
        (status = 200, description = "Recommended forward target for the facility", body = FacilityAdmin),
        (status = 400, description = "facility_type is required"),
        (status = 404, description = "No eligible admin exists"),
        (status = 500, description = "Failed to retrieve admins")
    ),
    tag = "Admins",
    security(("bearerAuth" = []))
)]
pub async fn get_recommended_admin(
    State(pool): State<PgPool>,
    Query(filter): Query<AdminFilter>,
) -> Result<ApiResponse<FacilityAdmin>, ApiResponse<()>> {
    let Some(facility) = filter.facility_type else {
        return Err(ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "facility_type is required",
            None,
        ));
    };

    // Pure lookup: the facility's own pool first, then the department pool.
    for candidate_pool in [AdminPool::from(facility), AdminPool::Department] {
        let admin: Option<FacilityAdmin> = sqlx::query_as(&format!(
            "SELECT {ADMIN_COLUMNS} FROM facility_admins WHERE pool = $1 ORDER BY id LIMIT 1"
        ))
        .bind(candidate_pool)
        .fetch_optional(&pool)
        .await
        .map_err(|e| ApiResponse::database_error("Failed to retrieve admins", e))?;

        if let Some(admin) = admin {
            return Ok(ApiResponse::success(
                StatusCode::OK,
                "Recommended admin retrieved",
                admin,
            ));
        }
    }

    Err(ApiResponse::<()>::error(
        StatusCode::NOT_FOUND,
        "No eligible admin exists for this facility",
        None,
    ))
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(list_admins, get_recommended_admin),
    components(schemas(FacilityAdmin, AdminPool)),
    tags(
        (name = "Admins", description = "Facility admin pools and forward-target recommendation")
    )
)]
pub struct AdminDoc;
