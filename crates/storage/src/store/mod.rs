#![forbid(unsafe_code)]

mod balance;
mod catalog;
mod completions;
mod error;
mod redemptions;
mod requests;
mod types;

pub use catalog::StarterTemplate;
pub use error::{ErrorKind, StoreError};
pub use requests::*;
pub use types::*;

use cp_core::ids::canonical_id;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) use balance::balance_for_child;

/// Durable points ledger over a single SQLite database. One handle per
/// caller; mutating operations take `&mut self` and run inside one
/// transaction, so a check and the write it guards are never split.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("chorepoint.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )?;

        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Transaction for check-then-write operations. IMMEDIATE takes the
    /// writer lock before the first read, so two stores racing on the
    /// same database serialize at the check instead of after it.
    pub(crate) fn write_tx(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS counters (
          name TEXT PRIMARY KEY,
          value INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS families (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS children (
          id TEXT PRIMARY KEY,
          family_id TEXT NOT NULL,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          FOREIGN KEY(family_id) REFERENCES families(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_children_family
          ON children(family_id);

        CREATE TABLE IF NOT EXISTS tasks (
          id TEXT PRIMARY KEY,
          family_id TEXT NOT NULL,
          name TEXT NOT NULL,
          icon TEXT NOT NULL,
          points INTEGER NOT NULL,
          max_per_day INTEGER,
          active INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(family_id) REFERENCES families(id) ON DELETE CASCADE,
          CHECK(points >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_family
          ON tasks(family_id, created_at_ms, id);

        CREATE TABLE IF NOT EXISTS rewards (
          id TEXT PRIMARY KEY,
          family_id TEXT NOT NULL,
          name TEXT NOT NULL,
          icon TEXT NOT NULL,
          price INTEGER NOT NULL,
          active INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(family_id) REFERENCES families(id) ON DELETE CASCADE,
          CHECK(price >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_rewards_family
          ON rewards(family_id, created_at_ms, id);

        CREATE TABLE IF NOT EXISTS completions (
          id TEXT PRIMARY KEY,
          child_id TEXT NOT NULL,
          task_id TEXT NOT NULL,
          completed_on TEXT NOT NULL,
          status TEXT NOT NULL,
          earned_points INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(child_id) REFERENCES children(id) ON DELETE CASCADE,
          FOREIGN KEY(task_id) REFERENCES tasks(id) ON DELETE RESTRICT,
          CHECK(status IN ('verified', 'undone')),
          CHECK(earned_points >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_completions_day
          ON completions(child_id, task_id, completed_on);

        CREATE INDEX IF NOT EXISTS idx_completions_child_status
          ON completions(child_id, status);

        CREATE TABLE IF NOT EXISTS redemptions (
          id TEXT PRIMARY KEY,
          child_id TEXT NOT NULL,
          reward_id TEXT NOT NULL,
          quantity INTEGER NOT NULL,
          points_spent INTEGER NOT NULL,
          status TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(child_id) REFERENCES children(id) ON DELETE CASCADE,
          FOREIGN KEY(reward_id) REFERENCES rewards(id) ON DELETE RESTRICT,
          CHECK(status IN ('pending', 'approved', 'rejected')),
          CHECK(quantity >= 1),
          CHECK(points_spent >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_redemptions_child_status
          ON redemptions(child_id, status);
        "#,
    )?;

    Ok(())
}

fn next_counter_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    let next = tx
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0)
        + 1;

    tx.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=excluded.value
        "#,
        params![name, next],
    )?;
    Ok(next)
}

fn ensure_family_tx(tx: &Transaction<'_>, family_id: &str) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM families WHERE id=?1",
            params![family_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(StoreError::FamilyNotFound)
    }
}

fn ensure_child_tx(tx: &Transaction<'_>, child_id: &str) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM children WHERE id=?1",
            params![child_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(StoreError::ChildNotFound)
    }
}

fn map_insert_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::DuplicateId;
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn canonicalize(field: &'static str, value: &str) -> Result<String, StoreError> {
    canonical_id(value.to_string()).map_err(|_| StoreError::InvalidInput(field))
}

fn canonicalize_child(value: &str) -> Result<String, StoreError> {
    canonicalize("invalid child_id", value)
}

fn canonicalize_task(value: &str) -> Result<String, StoreError> {
    canonicalize("invalid task_id", value)
}

fn canonicalize_reward(value: &str) -> Result<String, StoreError> {
    canonicalize("invalid reward_id", value)
}

fn canonicalize_log(value: &str) -> Result<String, StoreError> {
    canonicalize("invalid log_id", value)
}

fn canonicalize_redemption(value: &str) -> Result<String, StoreError> {
    canonicalize("invalid redemption_id", value)
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
