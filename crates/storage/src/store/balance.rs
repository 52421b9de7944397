#![forbid(unsafe_code)]

use super::*;
use cp_core::model::{CompletionStatus, RedemptionStatus};
use rusqlite::{Connection, params};

impl SqliteStore {
    /// Display read. Runs outside any writer lock and may lag a
    /// concurrent mutation; check-then-write paths use the
    /// same-transaction form instead.
    pub fn balance(&self, child_id: &str) -> Result<BalanceSummary, StoreError> {
        let child_id = canonicalize_child(child_id)?;
        balance_for_child(&self.conn, &child_id)
    }

    /// Verified points per child over the inclusive `[from, to]` date
    /// range, highest first. Ties break on name, then id.
    pub fn leaderboard(
        &self,
        request: LeaderboardRequest,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let family_id = canonicalize("invalid family_id", &request.family_id)?;
        if request.from > request.to {
            return Err(StoreError::InvalidInput("leaderboard range is inverted"));
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT children.id, children.name, COALESCE(SUM(completions.earned_points), 0) AS points
            FROM children
            LEFT JOIN completions
              ON completions.child_id = children.id
             AND completions.status = ?2
             AND completions.completed_on >= ?3
             AND completions.completed_on <= ?4
            WHERE children.family_id = ?1
            GROUP BY children.id, children.name
            ORDER BY points DESC, children.name ASC, children.id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![
            family_id,
            CompletionStatus::Verified.as_str(),
            request.from.as_str(),
            request.to.as_str()
        ])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(LeaderboardEntry {
                child_id: row.get(0)?,
                name: row.get(1)?,
                points: row.get(2)?,
            });
        }
        Ok(out)
    }
}

/// Single source of truth for a child's points. Verified completions
/// earn; pending and approved redemptions reserve or spend; nothing is
/// cached anywhere.
pub(crate) fn balance_for_child(
    conn: &Connection,
    child_id: &str,
) -> Result<BalanceSummary, StoreError> {
    let earned = conn.query_row(
        "SELECT COALESCE(SUM(earned_points), 0) FROM completions WHERE child_id=?1 AND status=?2",
        params![child_id, CompletionStatus::Verified.as_str()],
        |row| row.get::<_, i64>(0),
    )?;

    let approved_spent = conn.query_row(
        "SELECT COALESCE(SUM(points_spent), 0) FROM redemptions WHERE child_id=?1 AND status=?2",
        params![child_id, RedemptionStatus::Approved.as_str()],
        |row| row.get::<_, i64>(0),
    )?;

    let pending_spent = conn.query_row(
        "SELECT COALESCE(SUM(points_spent), 0) FROM redemptions WHERE child_id=?1 AND status=?2",
        params![child_id, RedemptionStatus::Pending.as_str()],
        |row| row.get::<_, i64>(0),
    )?;

    Ok(BalanceSummary {
        earned,
        approved_spent,
        pending_spent,
        available: earned - approved_spent - pending_spent,
    })
}
