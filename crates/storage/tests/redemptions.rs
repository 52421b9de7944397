#![forbid(unsafe_code)]

use cp_core::date::CalendarDate;
use cp_core::ids::FamilyId;
use cp_core::model::{RedemptionDecision, RedemptionStatus};
use cp_storage::{
    CreateChildRequest, CreateFamilyRequest, CreateRedemptionRequest, CreateRewardRequest,
    CreateTaskRequest, RecordCompletionRequest, SqliteStore, StoreError,
};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("cp_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn day(value: &str) -> CalendarDate {
    CalendarDate::try_new(value).expect("date")
}

/// Family, one child, one 5-point unlimited task, one 15-point reward.
fn seed(store: &mut SqliteStore) {
    store
        .create_family(CreateFamilyRequest {
            id: "fam-1".to_string(),
            name: "Testers".to_string(),
        })
        .expect("create family");
    store
        .create_child(CreateChildRequest {
            id: "kid-1".to_string(),
            family_id: "fam-1".to_string(),
            name: "Alex".to_string(),
        })
        .expect("create child");
    store
        .create_task(CreateTaskRequest {
            id: "task-1".to_string(),
            family_id: "fam-1".to_string(),
            name: "Chore".to_string(),
            icon: "🧹".to_string(),
            points: 5,
            max_per_day: Some(0),
            active: true,
        })
        .expect("create task");
    store
        .create_reward(CreateRewardRequest {
            id: "reward-1".to_string(),
            family_id: "fam-1".to_string(),
            name: "Treat".to_string(),
            icon: "🍦".to_string(),
            price: 15,
            active: true,
        })
        .expect("create reward");
}

fn earn(store: &mut SqliteStore, times: usize) {
    for _ in 0..times {
        store
            .record_completion(RecordCompletionRequest {
                child_id: "kid-1".to_string(),
                task_id: "task-1".to_string(),
                date: day("2025-03-01"),
            })
            .expect("record completion");
    }
}

fn redeem(store: &mut SqliteStore, quantity: i64) -> Result<cp_storage::RedemptionRow, StoreError> {
    store.create_redemption(CreateRedemptionRequest {
        child_id: "kid-1".to_string(),
        reward_id: "reward-1".to_string(),
        quantity,
    })
}

#[test]
fn insufficient_points_writes_nothing() {
    let dir = temp_dir("insufficient_points_writes_nothing");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 2); // balance 10, reward costs 15

    match redeem(&mut store, 1) {
        Err(StoreError::InsufficientPoints {
            available,
            required,
        }) => {
            assert_eq!(available, 10);
            assert_eq!(required, 15);
        }
        other => panic!("expected InsufficientPoints, got {other:?}"),
    }
    assert!(
        store
            .redemptions_for_child("kid-1")
            .expect("list")
            .is_empty()
    );

    earn(&mut store, 1); // balance 15
    let row = redeem(&mut store, 1).expect("redeem after earning enough");
    assert_eq!(row.points_spent, 15);
    assert_eq!(row.status, RedemptionStatus::Pending);
    assert_eq!(store.balance("kid-1").expect("balance").available, 0);
}

#[test]
fn rejection_releases_the_reservation() {
    let dir = temp_dir("rejection_releases_the_reservation");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 3); // balance 15

    let row = redeem(&mut store, 1).expect("redeem");
    assert_eq!(store.balance("kid-1").expect("balance").available, 0);

    let settled = store
        .settle_redemption(&row.id, RedemptionDecision::Reject)
        .expect("reject");
    assert_eq!(settled.status, RedemptionStatus::Rejected);

    let balance = store.balance("kid-1").expect("balance");
    assert_eq!(balance.available, 15);
    assert_eq!(balance.pending_spent, 0);
    assert_eq!(balance.approved_spent, 0);
}

#[test]
fn approval_moves_the_reservation_to_spent() {
    let dir = temp_dir("approval_moves_the_reservation_to_spent");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 4); // balance 20

    let row = redeem(&mut store, 1).expect("redeem");
    let settled = store
        .settle_redemption(&row.id, RedemptionDecision::Approve)
        .expect("approve");
    assert_eq!(settled.status, RedemptionStatus::Approved);

    let balance = store.balance("kid-1").expect("balance");
    assert_eq!(balance.earned, 20);
    assert_eq!(balance.approved_spent, 15);
    assert_eq!(balance.pending_spent, 0);
    assert_eq!(balance.available, 5);
}

#[test]
fn a_settled_redemption_cannot_transition_again() {
    let dir = temp_dir("a_settled_redemption_cannot_transition_again");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 3);

    let row = redeem(&mut store, 1).expect("redeem");
    store
        .settle_redemption(&row.id, RedemptionDecision::Approve)
        .expect("approve");

    match store.settle_redemption(&row.id, RedemptionDecision::Reject) {
        Err(StoreError::RedemptionSettled { status }) => {
            assert_eq!(status, RedemptionStatus::Approved);
        }
        other => panic!("expected RedemptionSettled, got {other:?}"),
    }
}

#[test]
fn settling_an_unknown_redemption_is_not_found() {
    let dir = temp_dir("settling_an_unknown_redemption_is_not_found");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);

    assert!(matches!(
        store.settle_redemption("RDM-000042", RedemptionDecision::Approve),
        Err(StoreError::RedemptionNotFound)
    ));
}

#[test]
fn quantity_below_one_is_coerced_and_quantity_multiplies_the_price() {
    let dir = temp_dir("quantity_below_one_is_coerced_and_quantity_multiplies_the_price");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 12); // balance 60

    let row = redeem(&mut store, 0).expect("coerced quantity");
    assert_eq!(row.quantity, 1);
    assert_eq!(row.points_spent, 15);

    let row = redeem(&mut store, 3).expect("bulk redemption");
    assert_eq!(row.quantity, 3);
    assert_eq!(row.points_spent, 45);

    assert_eq!(store.balance("kid-1").expect("balance").available, 0);
}

#[test]
fn pending_reservations_count_against_available() {
    let dir = temp_dir("pending_reservations_count_against_available");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 4); // balance 20

    redeem(&mut store, 1).expect("first redemption");

    // 5 points left; a second 15-point request must not pass.
    match redeem(&mut store, 1) {
        Err(StoreError::InsufficientPoints {
            available,
            required,
        }) => {
            assert_eq!(available, 5);
            assert_eq!(required, 15);
        }
        other => panic!("expected InsufficientPoints, got {other:?}"),
    }
}

#[test]
fn unknown_or_inactive_reward_is_not_found() {
    let dir = temp_dir("unknown_or_inactive_reward_is_not_found");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    earn(&mut store, 10);

    assert!(matches!(
        store.create_redemption(CreateRedemptionRequest {
            child_id: "kid-1".to_string(),
            reward_id: "reward-9".to_string(),
            quantity: 1,
        }),
        Err(StoreError::RewardNotFound)
    ));

    store
        .set_reward_active("reward-1", false)
        .expect("deactivate reward");
    assert!(matches!(
        redeem(&mut store, 1),
        Err(StoreError::RewardNotFound)
    ));
}

#[test]
fn family_listing_covers_every_child_in_the_family() {
    let dir = temp_dir("family_listing_covers_every_child_in_the_family");
    let mut store = SqliteStore::open(&dir).expect("open store");
    seed(&mut store);
    store
        .create_child(CreateChildRequest {
            id: "kid-2".to_string(),
            family_id: "fam-1".to_string(),
            name: "Billie".to_string(),
        })
        .expect("second child");
    earn(&mut store, 3);
    store
        .record_completion(RecordCompletionRequest {
            child_id: "kid-2".to_string(),
            task_id: "task-1".to_string(),
            date: day("2025-03-01"),
        })
        .expect("second child earns");
    store
        .record_completion(RecordCompletionRequest {
            child_id: "kid-2".to_string(),
            task_id: "task-1".to_string(),
            date: day("2025-03-01"),
        })
        .expect("second child earns");
    store
        .record_completion(RecordCompletionRequest {
            child_id: "kid-2".to_string(),
            task_id: "task-1".to_string(),
            date: day("2025-03-01"),
        })
        .expect("second child earns");

    redeem(&mut store, 1).expect("first child redeems");
    store
        .create_redemption(CreateRedemptionRequest {
            child_id: "kid-2".to_string(),
            reward_id: "reward-1".to_string(),
            quantity: 1,
        })
        .expect("second child redeems");

    let family = FamilyId::try_new("fam-1").expect("family id");
    let listed = store.redemptions_for_family(&family).expect("family list");
    assert_eq!(listed.len(), 2);

    let for_child = store.redemptions_for_child("kid-2").expect("child list");
    assert_eq!(for_child.len(), 1);
    assert_eq!(for_child[0].child_id, "kid-2");
}
