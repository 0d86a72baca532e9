// src/workflow.rs
//
// Pure transition rules for the request lifecycle. Handlers in
// db/queries/request.rs apply these before touching the database, and the
// UPDATEs themselves are guarded by the expected current status so that two
// concurrent actors cannot both win a transition.
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::json;

use crate::db::models::admin::AdminPool;
use crate::db::models::request::{DecisionAction, FacilityType, RequestStatus, ResolutionOutcome};

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors a lifecycle operation can surface. All are terminal for the
/// triggering call; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Request payload failed validation")]
    Validation(BTreeMap<String, String>),

    #[error("Cannot {action} a request in status {current:?}")]
    InvalidTransition {
        current: RequestStatus,
        action: &'static str,
    },

    #[error("Admin pool {pool:?} cannot receive {facility:?} requests")]
    Routing {
        facility: FacilityType,
        pool: AdminPool,
    },
}

impl WorkflowError {
    /// Structured detail for the response envelope's `errors` field.
    pub fn details(&self) -> serde_json::Value {
        match self {
            WorkflowError::Validation(fields) => json!(fields),
            WorkflowError::InvalidTransition { current, action } => {
                json!({ "current_status": current.as_str(), "action": action })
            }
            WorkflowError::Routing { facility, pool } => {
                json!({ "facility_type": facility.as_str(), "admin_pool": pool.as_str() })
            }
        }
    }
}

/// Faculty decision: only a pending request may be approved, rejected or
/// forwarded.
pub fn apply_decision(
    current: RequestStatus,
    action: DecisionAction,
) -> WorkflowResult<RequestStatus> {
    if current != RequestStatus::Pending {
        return Err(WorkflowError::InvalidTransition {
            current,
            action: "decide",
        });
    }
    Ok(match action {
        DecisionAction::Approve => RequestStatus::Approved,
        DecisionAction::Reject => RequestStatus::Rejected,
        DecisionAction::Forward => RequestStatus::Forwarded,
    })
}

/// Admin resolution: only a forwarded request may be completed, rejected or
/// cancelled.
pub fn apply_resolution(
    current: RequestStatus,
    outcome: ResolutionOutcome,
) -> WorkflowResult<RequestStatus> {
    if current != RequestStatus::Forwarded {
        return Err(WorkflowError::InvalidTransition {
            current,
            action: "resolve",
        });
    }
    Ok(match outcome {
        ResolutionOutcome::Approve => RequestStatus::Completed,
        ResolutionOutcome::Reject => RequestStatus::Rejected,
        ResolutionOutcome::Cancel => RequestStatus::Cancelled,
    })
}

/// A forward target must sit in the pool matching the request's facility
/// type. The generic department pool is eligible for every facility type.
pub fn check_forward_target(facility: FacilityType, pool: AdminPool) -> WorkflowResult<()> {
    if pool == AdminPool::Department || pool == AdminPool::from(facility) {
        Ok(())
    } else {
        Err(WorkflowError::Routing { facility, pool })
    }
}

/// The mutable lifecycle fields of a request. Transitions are computed here
/// and written to the database verbatim, so the invariants below hold in
/// both layers:
/// - `forwarded_to_admin_id` is set if and only if the status is Forwarded.
/// - `decided_at`/`decided_by` are written once, by the faculty decision; a
///   resolution leaves them untouched and records `resolved_by` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleState {
    pub status: RequestStatus,
    pub forwarded_to_admin_id: Option<i32>,
    pub decided_by: Option<i32>,
    pub decided_at: Option<NaiveDateTime>,
    pub resolved_by: Option<i32>,
}

impl LifecycleState {
    pub fn new_pending() -> Self {
        Self {
            status: RequestStatus::Pending,
            forwarded_to_admin_id: None,
            decided_by: None,
            decided_at: None,
            resolved_by: None,
        }
    }

    /// Forwarded ⇔ an admin owns the queue entry.
    pub fn assignment_consistent(&self) -> bool {
        (self.status == RequestStatus::Forwarded) == self.forwarded_to_admin_id.is_some()
    }
}

/// Compute the state after a faculty decision. `forward_to` is consulted
/// only when the action is Forward; eligibility of the target pool is the
/// caller's concern via [`check_forward_target`].
pub fn record_decision(
    current: &LifecycleState,
    action: DecisionAction,
    decider: i32,
    forward_to: Option<i32>,
    now: NaiveDateTime,
) -> WorkflowResult<LifecycleState> {
    let status = apply_decision(current.status, action)?;
    Ok(LifecycleState {
        status,
        forwarded_to_admin_id: if status == RequestStatus::Forwarded {
            forward_to
        } else {
            None
        },
        decided_by: Some(decider),
        decided_at: Some(now),
        resolved_by: None,
    })
}

/// Compute the state after an admin resolution. The assignment is released
/// and the resolver recorded; the decision timestamp is not touched.
pub fn record_resolution(
    current: &LifecycleState,
    outcome: ResolutionOutcome,
    resolver: i32,
) -> WorkflowResult<LifecycleState> {
    let status = apply_resolution(current.status, outcome)?;
    Ok(LifecycleState {
        status,
        forwarded_to_admin_id: None,
        decided_by: current.decided_by,
        decided_at: current.decided_at,
        resolved_by: Some(resolver),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_accepts_all_three_decisions() {
        assert_eq!(
            apply_decision(RequestStatus::Pending, DecisionAction::Approve).unwrap(),
            RequestStatus::Approved
        );
        assert_eq!(
            apply_decision(RequestStatus::Pending, DecisionAction::Reject).unwrap(),
            RequestStatus::Rejected
        );
        assert_eq!(
            apply_decision(RequestStatus::Pending, DecisionAction::Forward).unwrap(),
            RequestStatus::Forwarded
        );
    }

    #[test]
    fn second_decision_is_an_invalid_transition() {
        for decided in [
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Forwarded,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            let err = apply_decision(decided, DecisionAction::Approve).unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn resolution_requires_forwarded() {
        assert_eq!(
            apply_resolution(RequestStatus::Forwarded, ResolutionOutcome::Approve).unwrap(),
            RequestStatus::Completed
        );
        assert_eq!(
            apply_resolution(RequestStatus::Forwarded, ResolutionOutcome::Reject).unwrap(),
            RequestStatus::Rejected
        );
        assert_eq!(
            apply_resolution(RequestStatus::Forwarded, ResolutionOutcome::Cancel).unwrap(),
            RequestStatus::Cancelled
        );

        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            let err = apply_resolution(status, ResolutionOutcome::Approve).unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn forward_target_must_match_facility_pool() {
        assert!(check_forward_target(FacilityType::Auditorium, AdminPool::Auditorium).is_ok());
        assert!(check_forward_target(FacilityType::Stationery, AdminPool::Stationery).is_ok());

        let err =
            check_forward_target(FacilityType::Auditorium, AdminPool::Canteen).unwrap_err();
        assert!(matches!(err, WorkflowError::Routing { .. }));
    }

    #[test]
    fn department_pool_accepts_any_facility() {
        for facility in [
            FacilityType::Auditorium,
            FacilityType::Canteen,
            FacilityType::Sports,
            FacilityType::Stationery,
        ] {
            assert!(check_forward_target(facility, AdminPool::Department).is_ok());
        }
    }

    fn forwarded_state(admin_id: i32, decided_at: NaiveDateTime) -> LifecycleState {
        LifecycleState {
            status: RequestStatus::Forwarded,
            forwarded_to_admin_id: Some(admin_id),
            decided_by: Some(7),
            decided_at: Some(decided_at),
            resolved_by: None,
        }
    }

    fn noon() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 8, 25)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn assignment_is_set_exactly_while_forwarded() {
        let pending = LifecycleState::new_pending();
        assert!(pending.assignment_consistent());

        for action in [
            DecisionAction::Approve,
            DecisionAction::Reject,
            DecisionAction::Forward,
        ] {
            let decided = record_decision(&pending, action, 7, Some(42), noon()).unwrap();
            assert!(decided.assignment_consistent(), "after {action:?}");
            assert_eq!(
                decided.forwarded_to_admin_id.is_some(),
                decided.status == RequestStatus::Forwarded
            );
        }

        for outcome in [
            ResolutionOutcome::Approve,
            ResolutionOutcome::Reject,
            ResolutionOutcome::Cancel,
        ] {
            let resolved =
                record_resolution(&forwarded_state(42, noon()), outcome, 42).unwrap();
            assert!(resolved.assignment_consistent(), "after {outcome:?}");
            assert_eq!(resolved.forwarded_to_admin_id, None);
        }
    }

    #[test]
    fn resolution_completes_without_touching_the_decision_timestamp() {
        let pending = LifecycleState::new_pending();
        let forwarded =
            record_decision(&pending, DecisionAction::Forward, 7, Some(42), noon()).unwrap();
        assert_eq!(forwarded.status, RequestStatus::Forwarded);
        assert_eq!(forwarded.forwarded_to_admin_id, Some(42));
        assert_eq!(forwarded.decided_at, Some(noon()));

        let completed =
            record_resolution(&forwarded, ResolutionOutcome::Approve, 42).unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);
        assert_eq!(completed.decided_at, Some(noon()));
        assert_eq!(completed.decided_by, Some(7));
        assert_eq!(completed.resolved_by, Some(42));
        assert_eq!(completed.forwarded_to_admin_id, None);
    }

    #[test]
    fn record_decision_rejects_non_pending_states() {
        let err = record_decision(
            &forwarded_state(42, noon()),
            DecisionAction::Approve,
            7,
            None,
            noon(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn terminal_statuses_are_marked_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Forwarded.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }
}
