//! Time-sensitive activity views: calendar, event list and notification bell.
//!
//! All three rank and color activities through [`urgency::classify`]; the
//! tier-to-style mapping lives only in [`TierStyle::for_tier`].

use crate::opportunity::Opportunity;
use crate::urgency::{self, UrgencyTier};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ---------------------------------------------------------------------------
// TierStyle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierStyle {
    pub color: &'static str,
    pub weight: u16,
}

impl TierStyle {
    pub fn for_tier(tier: UrgencyTier) -> Self {
        match tier {
            UrgencyTier::Overdue => Self {
                color: "#d32f2f",
                weight: 700,
            },
            UrgencyTier::Urgent => Self {
                color: "#f57c00",
                weight: 600,
            },
            UrgencyTier::Soon => Self {
                color: "#fbc02d",
                weight: 500,
            },
            UrgencyTier::Later => Self {
                color: "#388e3c",
                weight: 400,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// AgendaItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgendaItem {
    pub key: String,
    pub opportunity_id: String,
    pub opportunity_name: String,
    pub activity_id: String,
    pub activity_type: String,
    pub note: String,
    pub due: DateTime<Utc>,
    pub days_until: i64,
    pub tier: UrgencyTier,
    pub style: TierStyle,
}

/// Every pending, dated activity across `records`, soonest first.
pub fn event_list(records: &[Opportunity], now: DateTime<Utc>) -> Vec<AgendaItem> {
    let mut items: Vec<AgendaItem> = records
        .iter()
        .flat_map(|opp| {
            opp.pending_activities().map(move |(activity, due)| {
                let tier = urgency::classify(due, now);
                AgendaItem {
                    key: format!("{}/{}", opp.id, activity.id),
                    opportunity_id: opp.id.clone(),
                    opportunity_name: opp.name.clone(),
                    activity_id: activity.id.clone(),
                    activity_type: activity.activity_type.clone(),
                    note: activity.note.clone(),
                    due,
                    days_until: urgency::days_until(due, now),
                    tier,
                    style: TierStyle::for_tier(tier),
                }
            })
        })
        .collect();
    items.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.key.cmp(&b.key)));
    items
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Most severe tier among the day's items.
    pub tier: UrgencyTier,
    pub style: TierStyle,
    pub items: Vec<AgendaItem>,
}

/// Pending activities grouped by UTC due date, restricted to `from..=to`.
pub fn calendar(
    records: &[Opportunity],
    now: DateTime<Utc>,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, Vec<AgendaItem>> = BTreeMap::new();
    for item in event_list(records, now) {
        let date = item.due.date_naive();
        if date < from || date > to {
            continue;
        }
        days.entry(date).or_default().push(item);
    }

    days.into_iter()
        .map(|(date, items)| {
            let tier = items
                .iter()
                .map(|i| i.tier)
                .min()
                .unwrap_or(UrgencyTier::Later);
            CalendarDay {
                date,
                tier,
                style: TierStyle::for_tier(tier),
                items,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ReadMarks
// ---------------------------------------------------------------------------

/// Session-scoped record of which bell items the user has seen.
///
/// Marks are valid for one UTC calendar day. The first access on a later day
/// finds them expired and starts over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadMarks {
    valid_for: Option<NaiveDate>,
    read: HashSet<String>,
}

impl ReadMarks {
    pub fn new() -> Self {
        Self::default()
    }

    fn roll(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.valid_for != Some(today) {
            if !self.read.is_empty() {
                tracing::debug!(cleared = self.read.len(), "read marks expired");
            }
            self.read.clear();
            self.valid_for = Some(today);
        }
    }

    pub fn mark_read(&mut self, key: &str, now: DateTime<Utc>) {
        self.roll(now);
        self.read.insert(key.to_string());
    }

    pub fn mark_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>, now: DateTime<Utc>) {
        self.roll(now);
        self.read.extend(keys.into_iter().map(str::to_string));
    }

    pub fn is_read(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.valid_for == Some(now.date_naive()) && self.read.contains(key)
    }
}

// ---------------------------------------------------------------------------
// Bell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BellItem {
    #[serde(flatten)]
    pub item: AgendaItem,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bell {
    pub unread: usize,
    pub items: Vec<BellItem>,
}

/// Overdue and urgent activities, most severe first, then soonest.
pub fn bell(records: &[Opportunity], now: DateTime<Utc>, marks: &ReadMarks) -> Bell {
    let mut items: Vec<BellItem> = event_list(records, now)
        .into_iter()
        .filter(|i| i.tier.is_pressing())
        .map(|item| BellItem {
            read: marks.is_read(&item.key, now),
            item,
        })
        .collect();
    // Stable: within a tier the event-list order (soonest first) is kept.
    items.sort_by_key(|b| b.item.tier);
    let unread = items.iter().filter(|b| !b.read).count();
    Bell { unread, items }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
