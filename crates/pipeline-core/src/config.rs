use crate::drag::CardTargetPolicy;
use crate::error::{PipelineError, Result};
use crate::{io, paths};
use crate::reconcile::ReconcilePolicy;
use crate::types::Taxonomy;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

/// Per-board reconciliation and drop behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub policy: ReconcilePolicy,
    /// Toast the new stage after a confirmed move.
    pub success_toast: bool,
    pub card_target: CardTargetPolicy,
}

impl BoardConfig {
    /// Main pipeline: silent on success, full revert on failure.
    pub fn primary() -> Self {
        Self {
            policy: ReconcilePolicy::StrictRevert,
            success_toast: false,
            card_target: CardTargetPolicy::ResolveToStage,
        }
    }

    /// Forecast board: toasts success, leaves repair to the next fetch.
    pub fn forecast() -> Self {
        Self {
            policy: ReconcilePolicy::DeferToNextFetch,
            success_toast: true,
            card_target: CardTargetPolicy::Ignore,
        }
    }
}

/// Both boards. Fields left out of a board's YAML block keep that board's
/// own defaults, so `forecast: { success_toast: false }` changes one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BoardsOverrides")]
pub struct BoardsConfig {
    pub primary: BoardConfig,
    pub forecast: BoardConfig,
}

#[derive(Debug, Default, Deserialize)]
struct BoardOverrides {
    policy: Option<ReconcilePolicy>,
    success_toast: Option<bool>,
    card_target: Option<CardTargetPolicy>,
}

impl BoardOverrides {
    fn over(self, base: BoardConfig) -> BoardConfig {
        BoardConfig {
            policy: self.policy.unwrap_or(base.policy),
            success_toast: self.success_toast.unwrap_or(base.success_toast),
            card_target: self.card_target.unwrap_or(base.card_target),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BoardsOverrides {
    #[serde(default)]
    primary: BoardOverrides,
    #[serde(default)]
    forecast: BoardOverrides,
}

impl From<BoardsOverrides> for BoardsConfig {
    fn from(raw: BoardsOverrides) -> Self {
        Self {
            primary: raw.primary.over(BoardConfig::primary()),
            forecast: raw.forecast.over(BoardConfig::forecast()),
        }
    }
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            primary: BoardConfig::primary(),
            forecast: BoardConfig::forecast(),
        }
    }
}

// ---------------------------------------------------------------------------
// GestureConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Mouse/pen travel in px before a press becomes a drag.
    #[serde(default = "default_pointer_distance")]
    pub pointer_distance: f64,
    /// Touch travel in px before a press becomes a drag.
    #[serde(default = "default_touch_distance")]
    pub touch_distance: f64,
    #[serde(default = "default_double_activation_ms")]
    pub double_activation_ms: u64,
}

fn default_pointer_distance() -> f64 {
    8.0
}

fn default_touch_distance() -> f64 {
    12.0
}

fn default_double_activation_ms() -> u64 {
    400
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pointer_distance: default_pointer_distance(),
            touch_distance: default_touch_distance(),
            double_activation_ms: default_double_activation_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig / ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
}

fn default_project_name() -> String {
    "pipeline".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub boards: BoardsConfig,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
            },
            boards: BoardsConfig::default(),
            gestures: GestureConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn board(&self, taxonomy: Taxonomy) -> &BoardConfig {
        match taxonomy {
            Taxonomy::Primary => &self.boards.primary,
            Taxonomy::Forecast => &self.boards.forecast,
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        io::read_yaml(&paths::config_path(root))?.ok_or(PipelineError::NotInitialized)
    }

    /// Load the project config, or fall back to defaults when the project
    /// has no config file yet.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(PipelineError::NotInitialized) => Ok(Self::new(default_project_name())),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::write_yaml(&paths::config_path(root), self)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (name, distance) in [
            ("pointer_distance", self.gestures.pointer_distance),
            ("touch_distance", self.gestures.touch_distance),
        ] {
            if !distance.is_finite() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("gestures.{name} is {distance}; expected a distance in px"),
                });
            } else if distance <= 0.0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "gestures.{name} is {distance}; every click will start a drag"
                    ),
                });
            }
        }

        if self.gestures.double_activation_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "gestures.double_activation_ms is 0; cards can never be opened"
                    .to_string(),
            });
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0; the OS will pick a port on every start".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
