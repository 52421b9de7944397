#![forbid(unsafe_code)]

pub mod ids {
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct FamilyId(String);

    impl FamilyId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
            Ok(Self(canonical_id(value.into())?))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ChildId(String);

    impl ChildId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
            Ok(Self(canonical_id(value.into())?))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum IdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    impl IdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "id must not be empty",
                Self::TooLong => "id is too long",
                Self::InvalidFirstChar => "id must start with an ascii letter or digit",
                Self::InvalidChar { .. } => "id contains an unsupported character",
            }
        }
    }

    /// Trims and validates an identifier supplied by the serving layer.
    /// Ids are opaque here; the caller decides whether they are UUIDs,
    /// slugs, or counter-derived tokens.
    pub fn canonical_id(value: String) -> Result<String, IdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.len() > 128 {
            return Err(IdError::TooLong);
        }
        let mut chars = trimmed.chars();
        let Some(first) = chars.next() else {
            return Err(IdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(IdError::InvalidFirstChar);
        }
        for (index, ch) in trimmed.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                continue;
            }
            return Err(IdError::InvalidChar { ch, index });
        }
        Ok(trimmed.to_string())
    }
}

pub mod date {
    /// Calendar day in `YYYY-MM-DD` form, no time-of-day and no zone.
    /// Timezone normalization happens before a date reaches the ledger.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CalendarDate(String);

    impl CalendarDate {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, CalendarDateError> {
            let value = value.into();
            validate_date(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum CalendarDateError {
        Malformed,
        MonthOutOfRange,
        DayOutOfRange,
    }

    impl CalendarDateError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Malformed => "date must be formatted as YYYY-MM-DD",
                Self::MonthOutOfRange => "date month must be between 01 and 12",
                Self::DayOutOfRange => "date day does not exist in that month",
            }
        }
    }

    fn validate_date(value: &str) -> Result<(), CalendarDateError> {
        let bytes = value.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(CalendarDateError::Malformed);
        }
        for (index, byte) in bytes.iter().enumerate() {
            if index == 4 || index == 7 {
                continue;
            }
            if !byte.is_ascii_digit() {
                return Err(CalendarDateError::Malformed);
            }
        }

        let year = parse_segment(&value[0..4]);
        let month = parse_segment(&value[5..7]);
        let day = parse_segment(&value[8..10]);

        if !(1..=12).contains(&month) {
            return Err(CalendarDateError::MonthOutOfRange);
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(CalendarDateError::DayOutOfRange);
        }
        Ok(())
    }

    fn parse_segment(segment: &str) -> i64 {
        segment.parse::<i64>().unwrap_or(0)
    }

    fn days_in_month(year: i64, month: i64) -> i64 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    fn is_leap_year(year: i64) -> bool {
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
    }
}

pub mod model {
    /// Ledger entries are never deleted; this is the only state a
    /// completion row moves between.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CompletionStatus {
        Verified,
        Undone,
    }

    impl CompletionStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Verified => "verified",
                Self::Undone => "undone",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value {
                "verified" => Some(Self::Verified),
                "undone" => Some(Self::Undone),
                _ => None,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum RedemptionStatus {
        Pending,
        Approved,
        Rejected,
    }

    impl RedemptionStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::Approved => "approved",
                Self::Rejected => "rejected",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value {
                "pending" => Some(Self::Pending),
                "approved" => Some(Self::Approved),
                "rejected" => Some(Self::Rejected),
                _ => None,
            }
        }

        /// Approved and rejected are terminal.
        pub fn is_settled(self) -> bool {
            !matches!(self, Self::Pending)
        }
    }

    /// The only two transitions out of `pending`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum RedemptionDecision {
        Approve,
        Reject,
    }

    impl RedemptionDecision {
        pub fn status(self) -> RedemptionStatus {
            match self {
                Self::Approve => RedemptionStatus::Approved,
                Self::Reject => RedemptionStatus::Rejected,
            }
        }
    }

    /// Per-day completion cap resolved from a task's raw `max_per_day`
    /// column: absent means one per day, zero means unlimited.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum DailyLimit {
        Unlimited,
        AtMost(i64),
    }

    impl DailyLimit {
        pub fn from_raw(raw: Option<i64>) -> Self {
            match raw {
                None => Self::AtMost(1),
                Some(n) if n <= 0 => Self::Unlimited,
                Some(n) => Self::AtMost(n),
            }
        }

        pub fn allows(self, verified_today: i64) -> bool {
            match self {
                Self::Unlimited => true,
                Self::AtMost(n) => verified_today < n,
            }
        }
    }
}

#[cfg(test)]
mod tests;
