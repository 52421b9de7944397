#![forbid(unsafe_code)]

use cp_core::date::CalendarDate;
use cp_storage::{
    CreateChildRequest, CreateFamilyRequest, CreateTaskRequest, RecordCompletionRequest,
    SqliteStore,
};
use rusqlite::{Connection, params};
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

#[test]
fn uncommitted_transaction_is_not_persisted_after_reopen() {
    let dir = temp_dir("uncommitted_transaction_is_not_persisted_after_reopen");
    let db_path;
    {
        let mut store = SqliteStore::open(&dir).expect("open store");
        db_path = store.storage_dir().join("chorepoint.db");
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
            .record_completion(RecordCompletionRequest {
                child_id: "kid-1".to_string(),
                task_id: "task-1".to_string(),
                date: CalendarDate::try_new("2025-03-01").expect("date"),
            })
            .expect("committed completion");
    }

    // Simulate a crash mid-operation: a raw transaction that inserts a
    // ledger row but never commits.
    {
        let mut conn = Connection::open(&db_path).expect("open db");
        let tx = conn.transaction().expect("begin tx");
        tx.execute(
            r#"
            INSERT INTO completions(id, child_id, task_id, completed_on, status, earned_points, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params!["LOG-999999", "kid-1", "task-1", "2025-03-01", "verified", 5, 0i64],
        )
        .expect("insert inside tx");
        // Dropped without commit.
    }

    let store = SqliteStore::open(&dir).expect("reopen store");
    let balance = store.balance("kid-1").expect("balance");
    assert_eq!(balance.earned, 5, "only the committed completion counts");

    let rows = store
        .completions_for_day("kid-1", &CalendarDate::try_new("2025-03-01").expect("date"))
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].id, "LOG-999999");
}
