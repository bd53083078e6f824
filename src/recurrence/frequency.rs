use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::calendar::{add_months, add_years};

/// A stored frequency that is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency \"{0}\"")]
pub struct FrequencyError(pub String);

/// How often a recurring transaction happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    /// Every seven days.
    Weekly,
    /// A calendar month of variable length.
    Monthly,
    /// A calendar year.
    Yearly,
}

impl Frequency {
    /// The value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// The date one period after `date`.
    ///
    /// Monthly and yearly steps clamp the day to the end of the target month,
    /// e.g. one month after 2024-01-31 is 2024-02-29. Returns `None` past the
    /// last date [Date] can represent.
    pub fn next_date(self, date: Date) -> Option<Date> {
        match self {
            Frequency::Weekly => date.checked_add(Duration::weeks(1)),
            Frequency::Monthly => add_months(date, 1),
            Frequency::Yearly => add_years(date, 1),
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(FrequencyError(other.to_owned())),
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: FrequencyError| FromSqlError::Other(Box::new(error)))
    }
}
