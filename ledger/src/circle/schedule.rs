use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often members contribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day
    Daily,
    /// Every 7 days
    Weekly,
    /// Every 14 days
    Biweekly,
    /// Every calendar month
    Monthly,
}

impl Frequency {
    /// Due date of a contribution scheduled at `from`.
    ///
    /// Monthly steps are calendar months, clamped to the last day of shorter
    /// months (Jan 31 → Feb 28).
    #[must_use]
    pub fn next_due_date(self, from: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self {
            Self::Daily => from.checked_add_days(Days::new(1)),
            Self::Weekly => from.checked_add_days(Days::new(7)),
            Self::Biweekly => from.checked_add_days(Days::new(14)),
            Self::Monthly => from.checked_add_months(Months::new(1)),
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Unknown names fall back to weekly.
impl From<&str> for Frequency {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "biweekly" => Self::Biweekly,
            "monthly" => Self::Monthly,
            _ => Self::Weekly,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of savings scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleType {
    /// Classic Ajo/Esusu: one payout per round in position order
    Rotational,
    /// Members save toward a shared target
    FixedTarget,
    /// Pooled emergency fund
    Emergency,
}
