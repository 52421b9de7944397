#![forbid(unsafe_code)]

use cp_core::model::RedemptionStatus;

/// Coarse classification the serving layer maps onto response codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unavailable,
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    FamilyNotFound,
    ChildNotFound,
    TaskNotFound,
    RewardNotFound,
    LogNotFound,
    RedemptionNotFound,
    LimitReached { limit: i64 },
    InsufficientPoints { available: i64, required: i64 },
    AlreadyUndone,
    AlreadyVerified,
    RedemptionSettled { status: RedemptionStatus },
    DuplicateId,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Sql(_) => ErrorKind::Unavailable,
            Self::InvalidInput(_) => ErrorKind::Validation,
            Self::FamilyNotFound
            | Self::ChildNotFound
            | Self::TaskNotFound
            | Self::RewardNotFound
            | Self::LogNotFound
            | Self::RedemptionNotFound => ErrorKind::NotFound,
            Self::LimitReached { .. }
            | Self::InsufficientPoints { .. }
            | Self::AlreadyUndone
            | Self::AlreadyVerified
            | Self::RedemptionSettled { .. }
            | Self::DuplicateId => ErrorKind::Conflict,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::FamilyNotFound => write!(f, "family not found"),
            Self::ChildNotFound => write!(f, "child not found"),
            Self::TaskNotFound => write!(f, "task not found"),
            Self::RewardNotFound => write!(f, "reward not found"),
            Self::LogNotFound => write!(f, "log not found or belongs to another family"),
            Self::RedemptionNotFound => write!(f, "redemption not found"),
            Self::LimitReached { limit } => {
                write!(f, "task already completed the maximum {limit} time(s) today")
            }
            Self::InsufficientPoints {
                available,
                required,
            } => write!(
                f,
                "insufficient points (available={available}, required={required})"
            ),
            Self::AlreadyUndone => write!(f, "log already undone"),
            Self::AlreadyVerified => write!(f, "log already verified"),
            Self::RedemptionSettled { status } => {
                write!(f, "redemption already settled as {}", status.as_str())
            }
            Self::DuplicateId => write!(f, "id already exists"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
