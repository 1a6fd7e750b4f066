use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PrimaryStage
// ---------------------------------------------------------------------------

/// Stage on the main sales pipeline board.
///
/// The wire identifiers are the ones the backend stores, including their
/// inconsistent casing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PrimaryStage {
    #[default]
    #[serde(rename = "opp sourced")]
    Sourced,
    #[serde(rename = "opp Nurturing")]
    Nurturing,
    #[serde(rename = "opp qualified")]
    Qualified,
    #[serde(rename = "opp in-progress")]
    InProgress,
    #[serde(rename = "Win")]
    Win,
    #[serde(rename = "lost")]
    Lost,
}

impl PrimaryStage {
    pub fn all() -> &'static [PrimaryStage] {
        &[
            PrimaryStage::Sourced,
            PrimaryStage::Nurturing,
            PrimaryStage::Qualified,
            PrimaryStage::InProgress,
            PrimaryStage::Win,
            PrimaryStage::Lost,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PrimaryStage::Sourced => "opp sourced",
            PrimaryStage::Nurturing => "opp Nurturing",
            PrimaryStage::Qualified => "opp qualified",
            PrimaryStage::InProgress => "opp in-progress",
            PrimaryStage::Win => "Win",
            PrimaryStage::Lost => "lost",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PrimaryStage::Sourced => "Sourced",
            PrimaryStage::Nurturing => "Nurturing",
            PrimaryStage::Qualified => "Qualified",
            PrimaryStage::InProgress => "In Progress",
            PrimaryStage::Win => "Won",
            PrimaryStage::Lost => "Lost",
        }
    }
}

impl fmt::Display for PrimaryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PrimaryStage {
    type Err = crate::error::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimaryStage::all()
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| crate::error::PipelineError::InvalidStage {
                taxonomy: Taxonomy::Primary.to_string(),
                stage: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// ForecastStage
// ---------------------------------------------------------------------------

/// Stage on the forecast triage board. Independent of [`PrimaryStage`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ForecastStage {
    #[default]
    #[serde(rename = "Source")]
    Source,
    #[serde(rename = "High Priority")]
    HighPriority,
    #[serde(rename = "Low Priority")]
    LowPriority,
}

impl ForecastStage {
    pub fn all() -> &'static [ForecastStage] {
        &[
            ForecastStage::Source,
            ForecastStage::HighPriority,
            ForecastStage::LowPriority,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ForecastStage::Source => "Source",
            ForecastStage::HighPriority => "High Priority",
            ForecastStage::LowPriority => "Low Priority",
        }
    }

    pub const fn label(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ForecastStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ForecastStage {
    type Err = crate::error::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForecastStage::all()
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| crate::error::PipelineError::InvalidStage {
                taxonomy: Taxonomy::Forecast.to_string(),
                stage: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    Primary,
    Forecast,
}

impl Taxonomy {
    pub fn all() -> &'static [Taxonomy] {
        &[Taxonomy::Primary, Taxonomy::Forecast]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Taxonomy::Primary => "primary",
            Taxonomy::Forecast => "forecast",
        }
    }

    /// Name of the record field this taxonomy governs, as sent to the backend.
    pub fn field(self) -> &'static str {
        match self {
            Taxonomy::Primary => "stage",
            Taxonomy::Forecast => "forecastStage",
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Taxonomy {
    type Err = crate::error::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Taxonomy::Primary),
            "forecast" => Ok(Taxonomy::Forecast),
            _ => Err(crate::error::PipelineError::UnknownTaxonomy(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Done,
    #[default]
    #[serde(other)]
    Pending,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityStatus::Done => "Done",
            ActivityStatus::Pending => "Pending",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity passed to the external notification surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn primary_stage_ids_roundtrip() {
        for stage in PrimaryStage::all() {
            assert_eq!(PrimaryStage::from_str(stage.as_str()).unwrap(), *stage);
        }
        assert!(PrimaryStage::from_str("opp nurturing").is_err());
    }

    #[test]
    fn forecast_stage_ids_roundtrip() {
        for stage in ForecastStage::all() {
            assert_eq!(ForecastStage::from_str(stage.as_str()).unwrap(), *stage);
        }
        assert!(ForecastStage::from_str("Medium").is_err());
    }

    #[test]
    fn stage_serde_uses_wire_ids() {
        let json = serde_json::to_string(&PrimaryStage::InProgress).unwrap();
        assert_eq!(json, "\"opp in-progress\"");
        let parsed: ForecastStage = serde_json::from_str("\"High Priority\"").unwrap();
        assert_eq!(parsed, ForecastStage::HighPriority);
    }

    #[test]
    fn defaults_are_first_stage() {
        assert_eq!(PrimaryStage::default(), PrimaryStage::all()[0]);
        assert_eq!(ForecastStage::default(), ForecastStage::all()[0]);
    }

    #[test]
    fn unknown_taxonomy_is_error() {
        assert!(matches!(
            Taxonomy::from_str("kanban"),
            Err(crate::error::PipelineError::UnknownTaxonomy(_))
        ));
    }

    #[test]
    fn activity_status_other_is_pending() {
        let s: ActivityStatus = serde_json::from_str("\"Scheduled\"").unwrap();
        assert_eq!(s, ActivityStatus::Pending);
        let d: ActivityStatus = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(d, ActivityStatus::Done);
    }
}
