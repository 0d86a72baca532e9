// src/db/models/request.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    Auditorium,
    Canteen,
    Sports,
    Stationery,
}

impl FacilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityType::Auditorium => "auditorium",
            FacilityType::Canteen => "canteen",
            FacilityType::Sports => "sports",
            FacilityType::Stationery => "stationery",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Forwarded,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Forwarded => "forwarded",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved
                | RequestStatus::Rejected
                | RequestStatus::Completed
                | RequestStatus::Cancelled
        )
    }
}

/// Faculty-side action on a pending request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    Reject,
    Forward,
}

/// Admin-side outcome for a forwarded request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Approve,
    Reject,
    Cancel,
}

/// Facility-specific request payload, discriminated by `facility_type`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(tag = "facility_type", rename_all = "snake_case")]
pub enum RequestPayload {
    Auditorium(AuditoriumPayload),
    Canteen(CanteenPayload),
    Sports(SportsPayload),
    Stationery(StationeryPayload),
}

impl RequestPayload {
    pub fn facility_type(&self) -> FacilityType {
        match self {
            RequestPayload::Auditorium(_) => FacilityType::Auditorium,
            RequestPayload::Canteen(_) => FacilityType::Canteen,
            RequestPayload::Sports(_) => FacilityType::Sports,
            RequestPayload::Stationery(_) => FacilityType::Stationery,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct AuditoriumPayload {
    pub event_name: String,
    pub department: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub attendees: i32,
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct CanteenPayload {
    pub pickup_date: NaiveDate,
    pub pickup_time: Option<NaiveTime>,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct OrderLine {
    pub name: String,
    pub quantity: i32,
    /// Unit price in rupees; 0 until resolved against the menu.
    #[serde(default)]
    pub price: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct SportsPayload {
    pub needed_date: NaiveDate,
    pub equipment: Vec<EquipmentLine>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct EquipmentLine {
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct StationeryPayload {
    pub items: Vec<StationeryLine>,
    pub print_job: Option<PrintJob>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct StationeryLine {
    pub item: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct PrintJob {
    pub description: String,
    pub copies: i32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FacilityRequest {
    pub id: Uuid,
    pub facility_type: FacilityType,
    pub requested_by: i32,
    pub requester_email: String,
    pub faculty_approver_email: String,
    pub payload: serde_json::Value,
    pub status: RequestStatus,
    pub forwarded_to_admin_id: Option<i32>,
    pub decided_by: Option<i32>,
    pub resolved_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}

impl FacilityRequest {
    /// Deserialize the stored JSONB payload back into its typed variant.
    pub fn typed_payload(&self) -> Result<RequestPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewFacilityRequest {
    pub faculty_approver_email: String,
    #[serde(flatten)]
    pub payload: RequestPayload,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionBody {
    pub action: DecisionAction,
    /// Target admin; required when `action` is `forward`.
    pub admin_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolutionBody {
    pub outcome: ResolutionOutcome,
}

#[derive(Debug, Serialize, Deserialize, Default, IntoParams, ToSchema)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub facility_type: Option<FacilityType>,
    /// Admin id currently owning the forwarded queue entry.
    pub assignee: Option<i32>,
    pub requested_by: Option<i32>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
