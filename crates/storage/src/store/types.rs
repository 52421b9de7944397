#![forbid(unsafe_code)]

use cp_core::model::{CompletionStatus, RedemptionStatus};
use serde::Serialize;
use serde::Serializer;

fn completion_status<S: Serializer>(
    status: &CompletionStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}

fn redemption_status<S: Serializer>(
    status: &RedemptionStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRow {
    pub id: String,
    pub name: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRow {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub icon: String,
    pub points: i64,
    pub max_per_day: Option<i64>,
    pub active: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRow {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub icon: String,
    pub price: i64,
    pub active: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRow {
    pub id: String,
    pub child_id: String,
    pub task_id: String,
    pub completed_on: String,
    #[serde(serialize_with = "completion_status")]
    pub status: CompletionStatus,
    pub earned_points: i64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRow {
    pub id: String,
    pub child_id: String,
    pub reward_id: String,
    pub quantity: i64,
    pub points_spent: i64,
    #[serde(serialize_with = "redemption_status")]
    pub status: RedemptionStatus,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Derived from ledger rows on every read; nothing in the schema caches
/// this, so it cannot drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub earned: i64,
    pub approved_spent: i64,
    pub pending_spent: i64,
    pub available: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub child_id: String,
    pub name: String,
    pub points: i64,
}
