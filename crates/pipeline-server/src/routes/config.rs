use axum::extract::State;
use axum::Json;
use pipeline_core::config::Config;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: effective project config plus validation warnings.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = Config::load_or_default(&root)?;
        let warnings = config.validate();
        Ok::<_, pipeline_core::PipelineError>(serde_json::json!({
            "config": config,
            "warnings": warnings,
        }))
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}
