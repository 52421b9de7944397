#![forbid(unsafe_code)]

use cp_core::date::CalendarDate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateFamilyRequest {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateChildRequest {
    pub id: String,
    pub family_id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub icon: String,
    pub points: i64,
    /// None keeps the default of one completion per day; zero lifts the
    /// cap entirely.
    pub max_per_day: Option<i64>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRewardRequest {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub icon: String,
    pub price: i64,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordCompletionRequest {
    pub child_id: String,
    pub task_id: String,
    pub date: CalendarDate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRedemptionRequest {
    pub child_id: String,
    pub reward_id: String,
    /// Values below one are coerced to one.
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardRequest {
    pub family_id: String,
    pub from: CalendarDate,
    pub to: CalendarDate,
}
