#![forbid(unsafe_code)]

use super::*;
use cp_core::ids::FamilyId;
use cp_core::model::{RedemptionDecision, RedemptionStatus};
use rusqlite::{Connection, OptionalExtension, params};

impl SqliteStore {
    /// Reserves points for a reward. The balance check and the insert
    /// run in one IMMEDIATE transaction; points are never partially
    /// reserved, so on any failure no row exists.
    pub fn create_redemption(
        &mut self,
        request: CreateRedemptionRequest,
    ) -> Result<RedemptionRow, StoreError> {
        let child_id = canonicalize_child(&request.child_id)?;
        let reward_id = canonicalize_reward(&request.reward_id)?;
        let quantity = if request.quantity < 1 { 1 } else { request.quantity };
        let now_ms = now_ms();

        let tx = self.write_tx()?;

        let Some(reward) = catalog::reward_row(&tx, &reward_id)? else {
            return Err(StoreError::RewardNotFound);
        };
        if !reward.active {
            return Err(StoreError::RewardNotFound);
        }
        ensure_child_tx(&tx, &child_id)?;

        let required = reward
            .price
            .checked_mul(quantity)
            .ok_or(StoreError::InvalidInput("redemption total overflows"))?;

        let balance = balance_for_child(&tx, &child_id)?;
        if balance.available < required {
            return Err(StoreError::InsufficientPoints {
                available: balance.available,
                required,
            });
        }

        let seq = next_counter_tx(&tx, "redemption_seq")?;
        let id = format!("RDM-{seq:06}");
        tx.execute(
            r#"
            INSERT INTO redemptions(id, child_id, reward_id, quantity, points_spent, status, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                id,
                child_id,
                reward_id,
                quantity,
                required,
                RedemptionStatus::Pending.as_str(),
                now_ms
            ],
        )?;

        let row = redemption_row(&tx, &id)?.ok_or(StoreError::RedemptionNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    /// Moves a pending request to its terminal status. A rejected
    /// request simply stops counting toward `pending_spent`; there is
    /// no separate refund step.
    pub fn settle_redemption(
        &mut self,
        redemption_id: &str,
        decision: RedemptionDecision,
    ) -> Result<RedemptionRow, StoreError> {
        let redemption_id = canonicalize_redemption(redemption_id)?;
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;

        let status = tx
            .query_row(
                "SELECT status FROM redemptions WHERE id=?1",
                params![redemption_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let Some(status) = status else {
            return Err(StoreError::RedemptionNotFound);
        };
        let status = RedemptionStatus::parse(&status)
            .ok_or(StoreError::InvalidInput("invalid redemption row"))?;
        if status.is_settled() {
            return Err(StoreError::RedemptionSettled { status });
        }

        tx.execute(
            "UPDATE redemptions SET status=?2, updated_at_ms=?3 WHERE id=?1",
            params![redemption_id, decision.status().as_str(), now_ms],
        )?;

        let row = redemption_row(&tx, &redemption_id)?.ok_or(StoreError::RedemptionNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn redemptions_for_child(&self, child_id: &str) -> Result<Vec<RedemptionRow>, StoreError> {
        let child_id = canonicalize_child(child_id)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, child_id, reward_id, quantity, points_spent, status, created_at_ms, updated_at_ms
            FROM redemptions
            WHERE child_id=?1
            ORDER BY created_at_ms ASC, id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![child_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_redemption_row(row)?);
        }
        Ok(out)
    }

    pub fn redemptions_for_family(
        &self,
        family: &FamilyId,
    ) -> Result<Vec<RedemptionRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT redemptions.id, redemptions.child_id, redemptions.reward_id,
                   redemptions.quantity, redemptions.points_spent, redemptions.status,
                   redemptions.created_at_ms, redemptions.updated_at_ms
            FROM redemptions
            JOIN children ON children.id = redemptions.child_id
            WHERE children.family_id=?1
            ORDER BY redemptions.created_at_ms ASC, redemptions.id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![family.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_redemption_row(row)?);
        }
        Ok(out)
    }
}

fn redemption_row(
    conn: &Connection,
    redemption_id: &str,
) -> Result<Option<RedemptionRow>, StoreError> {
    let found = conn
        .query_row(
            r#"
            SELECT id, child_id, reward_id, quantity, points_spent, status, created_at_ms, updated_at_ms
            FROM redemptions WHERE id=?1
            "#,
            params![redemption_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            },
        )
        .optional()?;

    match found {
        Some((id, child_id, reward_id, quantity, points_spent, status, created, updated)) => {
            let status = RedemptionStatus::parse(&status)
                .ok_or(StoreError::InvalidInput("invalid redemption row"))?;
            Ok(Some(RedemptionRow {
                id,
                child_id,
                reward_id,
                quantity,
                points_spent,
                status,
                created_at_ms: created,
                updated_at_ms: updated,
            }))
        }
        None => Ok(None),
    }
}

fn read_redemption_row(row: &rusqlite::Row<'_>) -> Result<RedemptionRow, StoreError> {
    let status: String = row.get(5)?;
    let status = RedemptionStatus::parse(&status)
        .ok_or(StoreError::InvalidInput("invalid redemption row"))?;
    Ok(RedemptionRow {
        id: row.get(0)?,
        child_id: row.get(1)?,
        reward_id: row.get(2)?,
        quantity: row.get(3)?,
        points_spent: row.get(4)?,
        status,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    })
}
