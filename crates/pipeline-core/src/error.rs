use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not initialized: run 'pipeline init'")]
    NotInitialized,

    #[error("opportunity not found: {0}")]
    OpportunityNotFound(String),

    #[error("unknown taxonomy: {0}")]
    UnknownTaxonomy(String),

    #[error("invalid {taxonomy} stage: {stage}")]
    InvalidStage { taxonomy: String, stage: String },

    #[error("drag already in progress for opportunity {0}")]
    DragInProgress(String),

    #[error("no drag in progress")]
    NoActiveDrag,

    #[error("stage update rejected: {0}")]
    UpdateRejected(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
