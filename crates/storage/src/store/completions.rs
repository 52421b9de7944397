#![forbid(unsafe_code)]

use super::*;
use cp_core::date::CalendarDate;
use cp_core::ids::FamilyId;
use cp_core::model::{CompletionStatus, DailyLimit};
use rusqlite::{Connection, OptionalExtension, params};

impl SqliteStore {
    /// Appends a verified ledger entry for (child, task, date) and
    /// returns it with the child's recomputed balance. The per-day
    /// limit check and the insert share one IMMEDIATE transaction, so
    /// concurrent calls for the same triple cannot both pass the check.
    pub fn record_completion(
        &mut self,
        request: RecordCompletionRequest,
    ) -> Result<(CompletionRow, BalanceSummary), StoreError> {
        let child_id = canonicalize_child(&request.child_id)?;
        let task_id = canonicalize_task(&request.task_id)?;
        let now_ms = now_ms();

        let tx = self.write_tx()?;

        let Some(task) = catalog::task_row(&tx, &task_id)? else {
            return Err(StoreError::TaskNotFound);
        };
        if !task.active {
            return Err(StoreError::TaskNotFound);
        }
        ensure_child_tx(&tx, &child_id)?;

        let limit = DailyLimit::from_raw(task.max_per_day);
        if let DailyLimit::AtMost(max) = limit {
            let verified_today = tx.query_row(
                r#"
                SELECT COUNT(1) FROM completions
                WHERE child_id=?1 AND task_id=?2 AND completed_on=?3 AND status=?4
                "#,
                params![
                    child_id,
                    task_id,
                    request.date.as_str(),
                    CompletionStatus::Verified.as_str()
                ],
                |row| row.get::<_, i64>(0),
            )?;
            if !limit.allows(verified_today) {
                return Err(StoreError::LimitReached { limit: max });
            }
        }

        let seq = next_counter_tx(&tx, "log_seq")?;
        let id = format!("LOG-{seq:06}");

        // earned_points snapshots the task's current value; later edits
        // to the task never reach this row.
        tx.execute(
            r#"
            INSERT INTO completions(id, child_id, task_id, completed_on, status, earned_points, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                id,
                child_id,
                task_id,
                request.date.as_str(),
                CompletionStatus::Verified.as_str(),
                task.points,
                now_ms
            ],
        )?;

        let row = completion_row(&tx, &id)?.ok_or(StoreError::LogNotFound)?;
        let balance = balance_for_child(&tx, &child_id)?;
        tx.commit()?;
        Ok((row, balance))
    }

    pub fn completions_for_day(
        &self,
        child_id: &str,
        date: &CalendarDate,
    ) -> Result<Vec<CompletionRow>, StoreError> {
        let child_id = canonicalize_child(child_id)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, child_id, task_id, completed_on, status, earned_points, created_at_ms, updated_at_ms
            FROM completions
            WHERE child_id=?1 AND completed_on=?2
            ORDER BY created_at_ms ASC, id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![child_id, date.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_completion_row(row)?);
        }
        Ok(out)
    }

    /// Family-scoped reversal. A log that does not exist and a log that
    /// belongs to another family produce the same error, so the answer
    /// never reveals whether a foreign id exists.
    pub fn undo_completion(
        &mut self,
        family: &FamilyId,
        log_id: &str,
    ) -> Result<CompletionRow, StoreError> {
        let log_id = canonicalize_log(log_id)?;
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;

        let found = tx
            .query_row(
                r#"
                SELECT children.family_id, completions.status
                FROM completions
                JOIN children ON children.id = completions.child_id
                WHERE completions.id=?1
                "#,
                params![log_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((owner_family, status)) = found else {
            return Err(StoreError::LogNotFound);
        };
        if owner_family != family.as_str() {
            return Err(StoreError::LogNotFound);
        }
        let status = CompletionStatus::parse(&status)
            .ok_or(StoreError::InvalidInput("invalid completion row"))?;
        if status != CompletionStatus::Verified {
            return Err(StoreError::AlreadyUndone);
        }

        tx.execute(
            "UPDATE completions SET status=?2, updated_at_ms=?3 WHERE id=?1",
            params![log_id, CompletionStatus::Undone.as_str(), now_ms],
        )?;

        let row = completion_row(&tx, &log_id)?.ok_or(StoreError::LogNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn redo_completion(&mut self, log_id: &str) -> Result<CompletionRow, StoreError> {
        let log_id = canonicalize_log(log_id)?;
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;

        let status = tx
            .query_row(
                "SELECT status FROM completions WHERE id=?1",
                params![log_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let Some(status) = status else {
            return Err(StoreError::LogNotFound);
        };
        let status = CompletionStatus::parse(&status)
            .ok_or(StoreError::InvalidInput("invalid completion row"))?;
        if status == CompletionStatus::Verified {
            return Err(StoreError::AlreadyVerified);
        }

        tx.execute(
            "UPDATE completions SET status=?2, updated_at_ms=?3 WHERE id=?1",
            params![log_id, CompletionStatus::Verified.as_str(), now_ms],
        )?;

        let row = completion_row(&tx, &log_id)?.ok_or(StoreError::LogNotFound)?;
        tx.commit()?;
        Ok(row)
    }
}

pub(crate) fn completion_row(
    conn: &Connection,
    log_id: &str,
) -> Result<Option<CompletionRow>, StoreError> {
    let found = conn
        .query_row(
            r#"
            SELECT id, child_id, task_id, completed_on, status, earned_points, created_at_ms, updated_at_ms
            FROM completions WHERE id=?1
            "#,
            params![log_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            },
        )
        .optional()?;

    match found {
        Some((id, child_id, task_id, completed_on, status, earned_points, created, updated)) => {
            let status = CompletionStatus::parse(&status)
                .ok_or(StoreError::InvalidInput("invalid completion row"))?;
            Ok(Some(CompletionRow {
                id,
                child_id,
                task_id,
                completed_on,
                status,
                earned_points,
                created_at_ms: created,
                updated_at_ms: updated,
            }))
        }
        None => Ok(None),
    }
}

fn read_completion_row(row: &rusqlite::Row<'_>) -> Result<CompletionRow, StoreError> {
    let status: String = row.get(4)?;
    let status = CompletionStatus::parse(&status)
        .ok_or(StoreError::InvalidInput("invalid completion row"))?;
    Ok(CompletionRow {
        id: row.get(0)?,
        child_id: row.get(1)?,
        task_id: row.get(2)?,
        completed_on: row.get(3)?,
        status,
        earned_points: row.get(5)?,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    })
}
