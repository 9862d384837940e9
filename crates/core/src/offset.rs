//! The four weekly time slices merged into a monthly record.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format used for partition keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One of the four time slices of a monthly record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Offset {
    Today,
    Week1,
    Week2,
    Week3,
}

impl Offset {
    /// In query order.
    pub const ALL: [Offset; 4] = [Offset::Today, Offset::Week1, Offset::Week2, Offset::Week3];

    /// Slices other than today, in query order.
    pub const HISTORY: [Offset; 3] = [Offset::Week1, Offset::Week2, Offset::Week3];

    /// Days before the reference date.
    pub fn days_back(&self) -> i64 {
        match self {
            Self::Today => 0,
            Self::Week1 => 7,
            Self::Week2 => 14,
            Self::Week3 => 21,
        }
    }

    /// Field-name label used in stored rows.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week1 => "week1",
            Self::Week2 => "week2",
            Self::Week3 => "week3",
        }
    }

    /// Partition date this slice reads for a given reference date.
    pub fn target_date(&self, reference: NaiveDate) -> NaiveDate {
        reference - Duration::days(self.days_back())
    }
}

/// Formats a date as a partition key.
pub fn partition_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a partition key.
pub fn parse_partition_key(key: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT)
        .map_err(|e| crate::Error::decode(format!("invalid date '{}': {}", key, e)))
}
