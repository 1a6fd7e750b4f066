use crate::error::Result;
use crate::types::{ActivityStatus, ForecastStage, PrimaryStage, Taxonomy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub status: ActivityStatus,
}

impl Activity {
    pub fn is_done(&self) -> bool {
        self.status == ActivityStatus::Done
    }
}

// ---------------------------------------------------------------------------
// Opportunity
// ---------------------------------------------------------------------------

/// One pursuit record as served by the backend.
///
/// Both stage fields are always present once deserialized: an absent, null or
/// unrecognized value becomes the first stage of its taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_stage")]
    pub stage: PrimaryStage,
    #[serde(default, deserialize_with = "lenient_stage")]
    pub forecast_stage: ForecastStage,
    #[serde(default)]
    pub value: f64,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub win_probability: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

fn default_priority() -> u8 {
    1
}

fn lenient_stage<'de, D, S>(de: D) -> std::result::Result<S, D::Error>
where
    D: Deserializer<'de>,
    S: FromStr + Default,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(match raw {
        None => S::default(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(stage = %value, "unrecognized stage, using default");
            S::default()
        }),
    })
}

impl Opportunity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stage: PrimaryStage::default(),
            forecast_stage: ForecastStage::default(),
            value: 0.0,
            priority: default_priority(),
            win_probability: 0,
            sector: None,
            agency: None,
            due_date: None,
            activities: Vec::new(),
        }
    }

    /// Stage identifier this record holds in the given taxonomy.
    pub fn stage_id(&self, taxonomy: Taxonomy) -> &'static str {
        match taxonomy {
            Taxonomy::Primary => self.stage.as_str(),
            Taxonomy::Forecast => self.forecast_stage.as_str(),
        }
    }

    /// Set the stage for one taxonomy and return the previous stage id.
    pub fn set_stage(&mut self, taxonomy: Taxonomy, stage_id: &str) -> Result<&'static str> {
        let previous = self.stage_id(taxonomy);
        match taxonomy {
            Taxonomy::Primary => self.stage = stage_id.parse()?,
            Taxonomy::Forecast => self.forecast_stage = stage_id.parse()?,
        }
        Ok(previous)
    }

    /// Activities that are not done and carry a due date.
    pub fn pending_activities(&self) -> impl Iterator<Item = (&Activity, DateTime<Utc>)> {
        self.activities
            .iter()
            .filter(|a| !a.is_done())
            .filter_map(|a| a.due_date.map(|due| (a, due)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
