#![forbid(unsafe_code)]

use super::*;
use cp_core::ids::FamilyId;
use rusqlite::{Connection, OptionalExtension, params};

/// Preset task sets applied when a family signs up, sized for younger
/// and older children. Names already present in the family are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarterTemplate {
    Junior,
    Senior,
}

/// (name, icon, points, max_per_day); zero lifts the per-day cap.
const JUNIOR_TASKS: &[(&str, &str, i64, i64)] = &[
    ("Make the bed", "🛏️", 10, 1),
    ("Brush teeth in the morning", "🪥", 5, 1),
    ("Brush teeth before bed", "🪥", 5, 1),
    ("Tidy the toy shelf", "🧸", 10, 1),
    ("Read a picture book", "📖", 15, 1),
    ("Practice writing letters", "✏️", 10, 1),
    ("Help set the table", "🍽️", 10, 0),
    ("Share with a friend", "🎁", 15, 0),
];

const SENIOR_TASKS: &[(&str, &str, i64, i64)] = &[
    ("Make the bed", "🛏️", 10, 1),
    ("Finish homework", "📚", 20, 1),
    ("Read for twenty minutes", "📖", 20, 0),
    ("Practice an instrument", "🎻", 25, 1),
    ("Take out the trash", "🗑️", 10, 1),
    ("Walk the dog", "🐕", 15, 0),
    ("Help cook dinner", "🍳", 20, 1),
    ("Extra chores", "🧹", 15, 0),
];

/// (name, icon, price).
const STARTER_REWARDS: &[(&str, &str, i64)] = &[
    ("Pick the movie night film", "🎬", 50),
    ("Thirty minutes of screen time", "📱", 30),
    ("Trip to the park", "🛝", 40),
    ("Choose what's for dinner", "🍕", 45),
    ("Stay up half an hour late", "🌙", 60),
    ("Small toy", "🚂", 100),
];

impl SqliteStore {
    pub fn create_family(&mut self, request: CreateFamilyRequest) -> Result<FamilyRow, StoreError> {
        let id = canonicalize("invalid family_id", &request.id)?;
        if request.name.trim().is_empty() {
            return Err(StoreError::InvalidInput("family name must not be empty"));
        }
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        let insert = tx.execute(
            "INSERT INTO families(id, name, created_at_ms) VALUES (?1, ?2, ?3)",
            params![id, request.name.trim(), now_ms],
        );
        if let Err(err) = insert {
            return Err(map_insert_conflict(err));
        }
        tx.commit()?;

        Ok(FamilyRow {
            id,
            name: request.name.trim().to_string(),
            created_at_ms: now_ms,
        })
    }

    pub fn create_child(&mut self, request: CreateChildRequest) -> Result<ChildRow, StoreError> {
        let id = canonicalize_child(&request.id)?;
        let family_id = canonicalize("invalid family_id", &request.family_id)?;
        if request.name.trim().is_empty() {
            return Err(StoreError::InvalidInput("child name must not be empty"));
        }
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        ensure_family_tx(&tx, &family_id)?;
        let insert = tx.execute(
            "INSERT INTO children(id, family_id, name, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![id, family_id, request.name.trim(), now_ms],
        );
        if let Err(err) = insert {
            return Err(map_insert_conflict(err));
        }
        tx.commit()?;

        Ok(ChildRow {
            id,
            family_id,
            name: request.name.trim().to_string(),
            created_at_ms: now_ms,
        })
    }

    pub fn create_task(&mut self, request: CreateTaskRequest) -> Result<TaskRow, StoreError> {
        let id = canonicalize_task(&request.id)?;
        let family_id = canonicalize("invalid family_id", &request.family_id)?;
        if request.name.trim().is_empty() {
            return Err(StoreError::InvalidInput("task name must not be empty"));
        }
        if request.points < 0 {
            return Err(StoreError::InvalidInput("task points must not be negative"));
        }
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        ensure_family_tx(&tx, &family_id)?;
        let insert = tx.execute(
            r#"
            INSERT INTO tasks(id, family_id, name, icon, points, max_per_day, active, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
            params![
                id,
                family_id,
                request.name.trim(),
                request.icon,
                request.points,
                request.max_per_day,
                request.active,
                now_ms
            ],
        );
        if let Err(err) = insert {
            return Err(map_insert_conflict(err));
        }
        let row = task_row(&tx, &id)?.ok_or(StoreError::TaskNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn create_reward(&mut self, request: CreateRewardRequest) -> Result<RewardRow, StoreError> {
        let id = canonicalize_reward(&request.id)?;
        let family_id = canonicalize("invalid family_id", &request.family_id)?;
        if request.name.trim().is_empty() {
            return Err(StoreError::InvalidInput("reward name must not be empty"));
        }
        if request.price < 0 {
            return Err(StoreError::InvalidInput("reward price must not be negative"));
        }
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        ensure_family_tx(&tx, &family_id)?;
        let insert = tx.execute(
            r#"
            INSERT INTO rewards(id, family_id, name, icon, price, active, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                id,
                family_id,
                request.name.trim(),
                request.icon,
                request.price,
                request.active,
                now_ms
            ],
        );
        if let Err(err) = insert {
            return Err(map_insert_conflict(err));
        }
        let row = reward_row(&tx, &id)?.ok_or(StoreError::RewardNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<TaskRow>, StoreError> {
        let task_id = canonicalize_task(task_id)?;
        task_row(&self.conn, &task_id)
    }

    pub fn get_reward(&self, reward_id: &str) -> Result<Option<RewardRow>, StoreError> {
        let reward_id = canonicalize_reward(reward_id)?;
        reward_row(&self.conn, &reward_id)
    }

    pub fn list_tasks(&self, family: &FamilyId) -> Result<Vec<TaskRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, family_id, name, icon, points, max_per_day, active, created_at_ms, updated_at_ms
            FROM tasks
            WHERE family_id=?1
            ORDER BY created_at_ms ASC, id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![family.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_task_row(row)?);
        }
        Ok(out)
    }

    pub fn list_rewards(&self, family: &FamilyId) -> Result<Vec<RewardRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, family_id, name, icon, price, active, created_at_ms, updated_at_ms
            FROM rewards
            WHERE family_id=?1
            ORDER BY created_at_ms ASC, id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![family.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_reward_row(row)?);
        }
        Ok(out)
    }

    /// Changing a task's value never touches existing ledger rows;
    /// completions keep the points they were worth when recorded.
    pub fn set_task_points(&mut self, task_id: &str, points: i64) -> Result<TaskRow, StoreError> {
        let task_id = canonicalize_task(task_id)?;
        if points < 0 {
            return Err(StoreError::InvalidInput("task points must not be negative"));
        }
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE tasks SET points=?2, updated_at_ms=?3 WHERE id=?1",
            params![task_id, points, now_ms],
        )?;
        if updated == 0 {
            return Err(StoreError::TaskNotFound);
        }
        let row = task_row(&tx, &task_id)?.ok_or(StoreError::TaskNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn set_task_active(&mut self, task_id: &str, active: bool) -> Result<TaskRow, StoreError> {
        let task_id = canonicalize_task(task_id)?;
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE tasks SET active=?2, updated_at_ms=?3 WHERE id=?1",
            params![task_id, active, now_ms],
        )?;
        if updated == 0 {
            return Err(StoreError::TaskNotFound);
        }
        let row = task_row(&tx, &task_id)?.ok_or(StoreError::TaskNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn set_reward_active(
        &mut self,
        reward_id: &str,
        active: bool,
    ) -> Result<RewardRow, StoreError> {
        let reward_id = canonicalize_reward(reward_id)?;
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE rewards SET active=?2, updated_at_ms=?3 WHERE id=?1",
            params![reward_id, active, now_ms],
        )?;
        if updated == 0 {
            return Err(StoreError::RewardNotFound);
        }
        let row = reward_row(&tx, &reward_id)?.ok_or(StoreError::RewardNotFound)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn apply_starter_template(
        &mut self,
        family: &FamilyId,
        template: StarterTemplate,
    ) -> Result<Vec<TaskRow>, StoreError> {
        let preset = match template {
            StarterTemplate::Junior => JUNIOR_TASKS,
            StarterTemplate::Senior => SENIOR_TASKS,
        };
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        ensure_family_tx(&tx, family.as_str())?;

        let mut created = Vec::new();
        for (name, icon, points, max_per_day) in preset {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM tasks WHERE family_id=?1 AND name=?2",
                    params![family.as_str(), name],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if exists {
                continue;
            }

            let seq = next_counter_tx(&tx, "task_seq")?;
            let id = format!("TSK-{seq:06}");
            tx.execute(
                r#"
                INSERT INTO tasks(id, family_id, name, icon, points, max_per_day, active, created_at_ms, updated_at_ms)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
                "#,
                params![id, family.as_str(), name, icon, points, max_per_day, now_ms],
            )?;
            created.push(task_row(&tx, &id)?.ok_or(StoreError::TaskNotFound)?);
        }

        tx.commit()?;
        Ok(created)
    }

    pub fn apply_starter_rewards(&mut self, family: &FamilyId) -> Result<Vec<RewardRow>, StoreError> {
        let now_ms = now_ms();

        let tx = self.conn.transaction()?;
        ensure_family_tx(&tx, family.as_str())?;

        let mut created = Vec::new();
        for (name, icon, price) in STARTER_REWARDS {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM rewards WHERE family_id=?1 AND name=?2",
                    params![family.as_str(), name],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if exists {
                continue;
            }

            let seq = next_counter_tx(&tx, "reward_seq")?;
            let id = format!("RWD-{seq:06}");
            tx.execute(
                r#"
                INSERT INTO rewards(id, family_id, name, icon, price, active, created_at_ms, updated_at_ms)
                VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
                "#,
                params![id, family.as_str(), name, icon, price, now_ms],
            )?;
            created.push(reward_row(&tx, &id)?.ok_or(StoreError::RewardNotFound)?);
        }

        tx.commit()?;
        Ok(created)
    }
}

pub(crate) fn task_row(conn: &Connection, task_id: &str) -> Result<Option<TaskRow>, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT id, family_id, name, icon, points, max_per_day, active, created_at_ms, updated_at_ms
            FROM tasks WHERE id=?1
            "#,
            params![task_id],
            |row| {
                Ok(TaskRow {
                    id: row.get(0)?,
                    family_id: row.get(1)?,
                    name: row.get(2)?,
                    icon: row.get(3)?,
                    points: row.get(4)?,
                    max_per_day: row.get(5)?,
                    active: row.get(6)?,
                    created_at_ms: row.get(7)?,
                    updated_at_ms: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub(crate) fn reward_row(
    conn: &Connection,
    reward_id: &str,
) -> Result<Option<RewardRow>, StoreError> {
    let row = conn
        .query_row(
            r#"
            SELECT id, family_id, name, icon, price, active, created_at_ms, updated_at_ms
            FROM rewards WHERE id=?1
            "#,
            params![reward_id],
            |row| {
                Ok(RewardRow {
                    id: row.get(0)?,
                    family_id: row.get(1)?,
                    name: row.get(2)?,
                    icon: row.get(3)?,
                    price: row.get(4)?,
                    active: row.get(5)?,
                    created_at_ms: row.get(6)?,
                    updated_at_ms: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

fn read_task_row(row: &rusqlite::Row<'_>) -> Result<TaskRow, StoreError> {
    Ok(TaskRow {
        id: row.get(0)?,
        family_id: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        points: row.get(4)?,
        max_per_day: row.get(5)?,
        active: row.get(6)?,
        created_at_ms: row.get(7)?,
        updated_at_ms: row.get(8)?,
    })
}

fn read_reward_row(row: &rusqlite::Row<'_>) -> Result<RewardRow, StoreError> {
    Ok(RewardRow {
        id: row.get(0)?,
        family_id: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        price: row.get(4)?,
        active: row.get(5)?,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    })
}
