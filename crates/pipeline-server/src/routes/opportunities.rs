use axum::extract::{Path, State};
use axum::Json;
use pipeline_core::store::OpportunityStore;
use pipeline_core::types::Taxonomy;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/opportunities: the full record set.
pub async fn list_opportunities(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let records = OpportunityStore::new(root).load_all()?;
        Ok::<_, pipeline_core::PipelineError>(serde_json::to_value(records)?)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}

/// GET /api/opportunities/:id: one record.
pub async fn get_opportunity(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let record = OpportunityStore::new(root).find(&id)?;
        Ok::<_, pipeline_core::PipelineError>(serde_json::to_value(record)?)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}

/// Exactly one of the two stage fields names the board being moved on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBody {
    pub stage: Option<String>,
    pub forecast_stage: Option<String>,
}

impl StageBody {
    fn target(self) -> Result<(Taxonomy, String), AppError> {
        match (self.stage, self.forecast_stage) {
            (Some(stage), None) => Ok((Taxonomy::Primary, stage)),
            (None, Some(stage)) => Ok((Taxonomy::Forecast, stage)),
            (Some(_), Some(_)) => Err(AppError::bad_request(
                "set either 'stage' or 'forecastStage', not both",
            )),
            (None, None) => Err(AppError::bad_request(
                "body must set 'stage' or 'forecastStage'",
            )),
        }
    }
}

/// PATCH /api/opportunities/:id: move a record to another stage.
///
/// A move that changes anything is broadcast on the event stream.
pub async fn update_stage(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StageBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (taxonomy, stage) = body.target()?;
    let root = app.root.clone();
    let mv = tokio::task::spawn_blocking(move || {
        OpportunityStore::new(root).set_stage(&id, taxonomy, &stage)
    })
    .await
    .map_err(AppError::join)??;

    if mv.changed() {
        app.invalidate();
    }

    Ok(Json(serde_json::json!({
        "id": mv.record_id,
        "taxonomy": mv.taxonomy,
        "field": mv.taxonomy.field(),
        "from": mv.from,
        "to": mv.to,
        "changed": mv.changed(),
    })))
}
