// src/db/models/admin.rs
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::request::FacilityType;

/// Queue a facility admin belongs to. `Department` is the generic pool that
/// may receive forwards for any facility type.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminPool {
    Auditorium,
    Canteen,
    Sports,
    Stationery,
    Department,
}

impl AdminPool {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminPool::Auditorium => "auditorium",
            AdminPool::Canteen => "canteen",
            AdminPool::Sports => "sports",
            AdminPool::Stationery => "stationery",
            AdminPool::Department => "department",
        }
    }
}

impl From<FacilityType> for AdminPool {
    fn from(facility: FacilityType) -> Self {
        match facility {
            FacilityType::Auditorium => AdminPool::Auditorium,
            FacilityType::Canteen => AdminPool::Canteen,
            FacilityType::Sports => AdminPool::Sports,
            FacilityType::Stationery => AdminPool::Stationery,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, ToSchema)]
pub struct FacilityAdmin {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub pool: AdminPool,
}

#[derive(Debug, Serialize, Deserialize, Default, IntoParams, ToSchema)]
pub struct AdminFilter {
    pub facility_type: Option<FacilityType>,
}
