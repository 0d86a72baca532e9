// src/validation.rs
//
// Per-facility payload validators. Pure and synchronous: a payload maps to a
// field -> message set, empty meaning the request may proceed. The current
// date and the stationery stock table are passed in so the rules stay
// deterministic under test.
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::db::models::request::{CanteenPayload, RequestPayload};
use crate::utils::menu::find_menu_item;

pub const MAX_AUDITORIUM_ATTENDEES: i32 = 500;
pub const MAX_PRINT_COPIES: i32 = 100;

pub type FieldErrors = BTreeMap<String, String>;

/// Validate a submission payload plus its nominated approver email.
/// `stationery_stock` maps lower-cased item names to available quantity.
pub fn validate_payload(
    payload: &RequestPayload,
    faculty_email: &str,
    today: NaiveDate,
    stationery_stock: &HashMap<String, i32>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !is_well_formed_email(faculty_email) {
        errors.insert(
            "faculty_approver_email".into(),
            "must be a well-formed email address".into(),
        );
    }

    match payload {
        RequestPayload::Auditorium(p) => {
            require_non_empty(&mut errors, "event_name", &p.event_name);
            require_non_empty(&mut errors, "department", &p.department);
            require_non_empty(&mut errors, "description", &p.description);
            require_non_empty(&mut errors, "location", &p.location);
            if p.event_date < today {
                errors.insert("event_date".into(), "cannot be in the past".into());
            }
            if p.start_time >= p.end_time {
                errors.insert(
                    "start_time".into(),
                    "start time must be before end time".into(),
                );
            }
            if p.attendees < 1 || p.attendees > MAX_AUDITORIUM_ATTENDEES {
                errors.insert(
                    "attendees".into(),
                    format!("must be between 1 and {MAX_AUDITORIUM_ATTENDEES}"),
                );
            }
        }
        RequestPayload::Canteen(p) => {
            if p.pickup_date < today {
                errors.insert("pickup_date".into(), "cannot be in the past".into());
            }
            if p.pickup_time.is_none() {
                errors.insert("pickup_time".into(), "pickup time is required".into());
            }
            if p.items.is_empty() {
                errors.insert("items".into(), "at least one order item is required".into());
            }
            for (i, line) in p.items.iter().enumerate() {
                if line.name.trim().is_empty() {
                    errors.insert(format!("items[{i}].name"), "item name is required".into());
                }
                if line.quantity < 1 {
                    errors.insert(format!("items[{i}].quantity"), "must be at least 1".into());
                }
            }
        }
        RequestPayload::Sports(p) => {
            if p.needed_date < today {
                errors.insert("needed_date".into(), "cannot be in the past".into());
            }
            if p.equipment.is_empty() {
                errors.insert(
                    "equipment".into(),
                    "at least one equipment item is required".into(),
                );
            }
            for (i, line) in p.equipment.iter().enumerate() {
                if line.name.trim().is_empty() {
                    errors.insert(
                        format!("equipment[{i}].name"),
                        "equipment name is required".into(),
                    );
                }
                if line.quantity < 1 {
                    errors.insert(
                        format!("equipment[{i}].quantity"),
                        "must be at least 1".into(),
                    );
                }
            }
        }
        RequestPayload::Stationery(p) => {
            if p.items.is_empty() && p.print_job.is_none() {
                errors.insert(
                    "items".into(),
                    "at least one item or a print job is required".into(),
                );
            }
            for (i, line) in p.items.iter().enumerate() {
                if line.item.trim().is_empty() {
                    errors.insert(format!("items[{i}].item"), "item name is required".into());
                    continue;
                }
                match stationery_stock.get(&line.item.trim().to_lowercase()) {
                    None => {
                        errors.insert(format!("items[{i}].item"), "unknown stock item".into());
                    }
                    Some(&available) if line.quantity < 1 || line.quantity > available => {
                        errors.insert(
                            format!("items[{i}].quantity"),
                            format!("must be between 1 and {available} (available stock)"),
                        );
                    }
                    Some(_) => {}
                }
            }
            if let Some(job) = &p.print_job {
                require_non_empty(&mut errors, "print_job.description", &job.description);
                if job.copies < 1 || job.copies > MAX_PRINT_COPIES {
                    errors.insert(
                        "print_job.copies".into(),
                        format!("must be between 1 and {MAX_PRINT_COPIES}"),
                    );
                }
            }
        }
    }

    errors
}

/// Resolve canteen order prices against the static menu. Unmatched names
/// keep price 0; pricing is soft, never a validation failure.
pub fn resolve_order_prices(payload: &mut CanteenPayload) {
    for line in &mut payload.items {
        match find_menu_item(&line.name) {
            Some(item) => {
                line.name = item.name.to_string();
                line.price = item.price;
            }
            None => line.price = 0,
        }
    }
}

fn require_non_empty(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.into(), format!("{field} is required"));
    }
}

/// Structural email check: one `@`, a non-empty local part and a dotted
/// domain. Deliverability is not our problem.
pub fn is_well_formed_email(email: &str) -> bool {
    let email = email.trim();
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::db::models::request::{
        AuditoriumPayload, EquipmentLine, OrderLine, PrintJob, SportsPayload, StationeryLine,
        StationeryPayload,
    };

    const FACULTY: &str = "prof.rao@college.edu";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    fn auditorium_payload() -> RequestPayload {
        RequestPayload::Auditorium(AuditoriumPayload {
            event_name: "Tech Symposium".into(),
            department: "CSE".into(),
            description: "Annual department symposium".into(),
            event_date: today() + chrono::Days::new(7),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            attendees: 200,
            location: "Main Auditorium".into(),
        })
    }

    #[test]
    fn valid_auditorium_payload_has_no_errors() {
        let errors = validate_payload(&auditorium_payload(), FACULTY, today(), &HashMap::new());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn past_event_date_is_rejected() {
        let RequestPayload::Auditorium(mut p) = auditorium_payload() else {
            unreachable!()
        };
        p.event_date = today() - chrono::Days::new(1);
        let errors = validate_payload(
            &RequestPayload::Auditorium(p),
            FACULTY,
            today(),
            &HashMap::new(),
        );
        assert_eq!(
            errors.get("event_date").map(String::as_str),
            Some("cannot be in the past")
        );
    }

    #[test]
    fn start_time_must_precede_end_time() {
        let RequestPayload::Auditorium(mut p) = auditorium_payload() else {
            unreachable!()
        };
        p.start_time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        p.end_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let errors = validate_payload(
            &RequestPayload::Auditorium(p),
            FACULTY,
            today(),
            &HashMap::new(),
        );
        assert!(errors.contains_key("start_time"));
    }

    #[test]
    fn attendee_count_bounds_are_enforced() {
        for bad in [0, 501] {
            let RequestPayload::Auditorium(mut p) = auditorium_payload() else {
                unreachable!()
            };
            p.attendees = bad;
            let errors = validate_payload(
                &RequestPayload::Auditorium(p),
                FACULTY,
                today(),
                &HashMap::new(),
            );
            assert!(errors.contains_key("attendees"), "expected error for {bad}");
        }
    }

    #[test]
    fn malformed_faculty_email_is_rejected() {
        for bad in ["", "not-an-email", "a@b", "two words@x.org", "a@@b.com"] {
            let errors = validate_payload(&auditorium_payload(), bad, today(), &HashMap::new());
            assert!(
                errors.contains_key("faculty_approver_email"),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn canteen_order_needs_at_least_one_named_item() {
        let payload = RequestPayload::Canteen(CanteenPayload {
            pickup_date: today(),
            pickup_time: None,
            items: vec![],
        });
        let errors = validate_payload(&payload, FACULTY, today(), &HashMap::new());
        assert!(errors.contains_key("items"));
        assert!(errors.contains_key("pickup_time"));
    }

    #[test]
    fn canteen_prices_resolve_by_substring_match() {
        let mut payload = CanteenPayload {
            pickup_date: today(),
            pickup_time: NaiveTime::from_hms_opt(13, 0, 0),
            items: vec![
                OrderLine {
                    name: "dosa".into(),
                    quantity: 2,
                    price: 0,
                },
                OrderLine {
                    name: "pizza".into(),
                    quantity: 1,
                    price: 0,
                },
            ],
        };
        resolve_order_prices(&mut payload);
        assert_eq!(payload.items[0].name, "Masala Dosa");
        assert_eq!(payload.items[0].price, 60);
        // Unknown items keep price 0 and their original name.
        assert_eq!(payload.items[1].name, "pizza");
        assert_eq!(payload.items[1].price, 0);
    }

    #[test]
    fn sports_payload_checks_date_and_quantities() {
        let payload = RequestPayload::Sports(SportsPayload {
            needed_date: today() - chrono::Days::new(2),
            equipment: vec![EquipmentLine {
                name: "Cricket bat".into(),
                quantity: 0,
            }],
        });
        let errors = validate_payload(&payload, FACULTY, today(), &HashMap::new());
        assert_eq!(
            errors.get("needed_date").map(String::as_str),
            Some("cannot be in the past")
        );
        assert!(errors.contains_key("equipment[0].quantity"));
    }

    #[test]
    fn stationery_quantity_is_capped_by_available_stock() {
        let stock = HashMap::from([("a4 notebook".to_string(), 5)]);
        let payload = RequestPayload::Stationery(StationeryPayload {
            items: vec![StationeryLine {
                item: "A4 Notebook".into(),
                quantity: 6,
            }],
            print_job: None,
        });
        let errors = validate_payload(&payload, FACULTY, today(), &stock);
        assert_eq!(
            errors.get("items[0].quantity").map(String::as_str),
            Some("must be between 1 and 5 (available stock)")
        );
    }

    #[test]
    fn print_copy_count_is_bounded() {
        let payload = RequestPayload::Stationery(StationeryPayload {
            items: vec![],
            print_job: Some(PrintJob {
                description: "Lab manual".into(),
                copies: 101,
            }),
        });
        let errors = validate_payload(&payload, FACULTY, today(), &HashMap::new());
        assert!(errors.contains_key("print_job.copies"));
    }

    #[test]
    fn validation_is_deterministic() {
        let RequestPayload::Auditorium(mut p) = auditorium_payload() else {
            unreachable!()
        };
        p.event_name = String::new();
        p.attendees = 0;
        let payload = RequestPayload::Auditorium(p);
        let first = validate_payload(&payload, "bad-email", today(), &HashMap::new());
        let second = validate_payload(&payload, "bad-email", today(), &HashMap::new());
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
