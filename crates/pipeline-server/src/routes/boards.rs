use axum::extract::{Path, State};
use axum::Json;
use pipeline_core::board;
use pipeline_core::catalog::catalog;
use pipeline_core::store::OpportunityStore;
use pipeline_core::types::Taxonomy;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/boards/:taxonomy: records partitioned into stage columns, with
/// per-column totals.
pub async fn get_board(
    State(app): State<AppState>,
    Path(taxonomy): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let taxonomy: Taxonomy = taxonomy.parse()?;
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let records = OpportunityStore::new(root).load_all()?;
        let partition = board::partition(&records, taxonomy);
        let columns: Vec<serde_json::Value> = partition
            .buckets
            .iter()
            .zip(partition.aggregate())
            .map(|(bucket, summary)| {
                serde_json::json!({
                    "stage": summary.stage,
                    "label": summary.label,
                    "count": summary.count,
                    "total_value": summary.total_value,
                    "mean_win_probability": summary.mean_win_probability,
                    "records": bucket.records,
                })
            })
            .collect();
        Ok::<_, pipeline_core::PipelineError>(serde_json::json!({
            "taxonomy": taxonomy,
            "field": taxonomy.field(),
            "columns": columns,
        }))
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}

/// GET /api/catalog/:taxonomy: ordered stage ids and labels.
pub async fn get_catalog(Path(taxonomy): Path<String>) -> Result<Json<serde_json::Value>, AppError> {
    let taxonomy: Taxonomy = taxonomy.parse()?;
    Ok(Json(serde_json::to_value(catalog(taxonomy))?))
}
