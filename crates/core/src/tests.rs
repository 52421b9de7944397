#![forbid(unsafe_code)]

use crate::date::{CalendarDate, CalendarDateError};
use crate::ids::{ChildId, FamilyId, IdError, canonical_id};
use crate::model::{CompletionStatus, DailyLimit, RedemptionDecision, RedemptionStatus};

#[test]
fn canonical_id_trims_and_accepts_common_shapes() {
    assert_eq!(
        canonical_id("  child-01 ".to_string()).expect("canonical"),
        "child-01"
    );
    assert_eq!(
        canonical_id("550e8400-e29b-41d4-a716-446655440000".to_string()).expect("canonical"),
        "550e8400-e29b-41d4-a716-446655440000"
    );
}

#[test]
fn canonical_id_rejects_bad_input() {
    assert_eq!(canonical_id("   ".to_string()), Err(IdError::Empty));
    assert_eq!(
        canonical_id("-leading".to_string()),
        Err(IdError::InvalidFirstChar)
    );
    assert_eq!(
        canonical_id("a".repeat(129)),
        Err(IdError::TooLong)
    );
    assert!(matches!(
        canonical_id("child 01".to_string()),
        Err(IdError::InvalidChar { ch: ' ', index: 5 })
    ));
}

#[test]
fn typed_ids_share_the_canonical_rules() {
    assert!(FamilyId::try_new("fam_1").is_ok());
    assert!(ChildId::try_new("").is_err());
    assert_eq!(ChildId::try_new(" kid-9 ").expect("child id").as_str(), "kid-9");
}

#[test]
fn calendar_date_accepts_real_days() {
    for value in ["2025-03-01", "2024-02-29", "1999-12-31", "2025-06-30"] {
        assert!(CalendarDate::try_new(value).is_ok(), "rejected {value}");
    }
}

#[test]
fn calendar_date_rejects_malformed_and_impossible_days() {
    assert_eq!(
        CalendarDate::try_new("2025-3-01").unwrap_err(),
        CalendarDateError::Malformed
    );
    assert_eq!(
        CalendarDate::try_new("2025/03/01").unwrap_err(),
        CalendarDateError::Malformed
    );
    assert_eq!(
        CalendarDate::try_new("2025-13-01").unwrap_err(),
        CalendarDateError::MonthOutOfRange
    );
    assert_eq!(
        CalendarDate::try_new("2025-02-29").unwrap_err(),
        CalendarDateError::DayOutOfRange
    );
    assert_eq!(
        CalendarDate::try_new("2025-04-31").unwrap_err(),
        CalendarDateError::DayOutOfRange
    );
}

#[test]
fn calendar_dates_order_chronologically() {
    let earlier = CalendarDate::try_new("2025-03-01").expect("date");
    let later = CalendarDate::try_new("2025-03-02").expect("date");
    assert!(earlier < later);
}

#[test]
fn statuses_round_trip_through_their_wire_strings() {
    for status in [CompletionStatus::Verified, CompletionStatus::Undone] {
        assert_eq!(CompletionStatus::parse(status.as_str()), Some(status));
    }
    for status in [
        RedemptionStatus::Pending,
        RedemptionStatus::Approved,
        RedemptionStatus::Rejected,
    ] {
        assert_eq!(RedemptionStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(CompletionStatus::parse("deleted"), None);
    assert_eq!(RedemptionStatus::parse(""), None);
}

#[test]
fn settled_statuses_are_terminal() {
    assert!(!RedemptionStatus::Pending.is_settled());
    assert!(RedemptionStatus::Approved.is_settled());
    assert!(RedemptionStatus::Rejected.is_settled());
    assert_eq!(
        RedemptionDecision::Approve.status(),
        RedemptionStatus::Approved
    );
    assert_eq!(
        RedemptionDecision::Reject.status(),
        RedemptionStatus::Rejected
    );
}

#[test]
fn daily_limit_resolves_raw_column_values() {
    assert_eq!(DailyLimit::from_raw(None), DailyLimit::AtMost(1));
    assert_eq!(DailyLimit::from_raw(Some(0)), DailyLimit::Unlimited);
    assert_eq!(DailyLimit::from_raw(Some(-3)), DailyLimit::Unlimited);
    assert_eq!(DailyLimit::from_raw(Some(4)), DailyLimit::AtMost(4));
}

#[test]
fn daily_limit_allows_counts_below_the_cap() {
    let limit = DailyLimit::from_raw(Some(2));
    assert!(limit.allows(0));
    assert!(limit.allows(1));
    assert!(!limit.allows(2));
    assert!(DailyLimit::Unlimited.allows(10_000));
}
