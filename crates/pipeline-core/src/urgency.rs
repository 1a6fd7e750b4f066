use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Last whole-day count still classified as urgent.
pub const URGENT_MAX_DAYS: i64 = 6;
/// Last whole-day count still classified as soon.
pub const SOON_MAX_DAYS: i64 = 15;

// ---------------------------------------------------------------------------
// UrgencyTier
// ---------------------------------------------------------------------------

/// Severity of a due date relative to now. Ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Overdue,
    Urgent,
    Soon,
    Later,
}

impl UrgencyTier {
    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyTier::Overdue => "overdue",
            UrgencyTier::Urgent => "urgent",
            UrgencyTier::Soon => "soon",
            UrgencyTier::Later => "later",
        }
    }

    /// Tiers that demand attention now (bell-worthy).
    pub fn is_pressing(self) -> bool {
        matches!(self, UrgencyTier::Overdue | UrgencyTier::Urgent)
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whole days from `now` until `due`.
///
/// Future instants round up to the next whole day and past instants round
/// down, so anything already due is negative and anything still ahead is
/// zero or more.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (due - now).num_milliseconds();
    if ms >= 0 {
        (ms + DAY_MS - 1).div_euclid(DAY_MS)
    } else {
        ms.div_euclid(DAY_MS)
    }
}

/// Classify `due` against the caller-supplied `now`. Total and deterministic.
pub fn classify(due: DateTime<Utc>, now: DateTime<Utc>) -> UrgencyTier {
    match days_until(due, now) {
        d if d < 0 => UrgencyTier::Overdue,
        d if d <= URGENT_MAX_DAYS => UrgencyTier::Urgent,
        d if d <= SOON_MAX_DAYS => UrgencyTier::Soon,
        _ => UrgencyTier::Later,
    }
}
