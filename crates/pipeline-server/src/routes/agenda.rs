use axum::extract::{Query, State};
use axum::Json;
use chrono::{Datelike, Months, NaiveDate, Utc};
use pipeline_core::agenda::{self, ReadMarks};
use pipeline_core::store::OpportunityStore;
use serde::Deserialize;
use std::sync::MutexGuard;

use crate::error::AppError;
use crate::state::AppState;

fn marks(app: &AppState) -> MutexGuard<'_, ReadMarks> {
    app.read_marks.lock().unwrap_or_else(|e| e.into_inner())
}

/// GET /api/agenda/events: pending activities, soonest first.
pub async fn list_events(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let records = OpportunityStore::new(root).load_all()?;
        let items = agenda::event_list(&records, Utc::now());
        Ok::<_, pipeline_core::PipelineError>(serde_json::to_value(items)?)
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct CalendarParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// First and last day of the month containing `day`.
fn month_of(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);
    (first, last)
}

/// GET /api/agenda/calendar?from=&to=: activities grouped by due day.
/// Defaults to the current month.
pub async fn get_calendar(
    State(app): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now();
    let (month_start, month_end) = month_of(now.date_naive());
    let from = params.from.unwrap_or(month_start);
    let to = params.to.unwrap_or(month_end);
    if from > to {
        return Err(AppError::bad_request(format!(
            "calendar range is empty: {from} is after {to}"
        )));
    }

    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let records = OpportunityStore::new(root).load_all()?;
        let days = agenda::calendar(&records, now, from, to);
        Ok::<_, pipeline_core::PipelineError>(serde_json::json!({
            "from": from,
            "to": to,
            "days": days,
        }))
    })
    .await
    .map_err(AppError::join)??;

    Ok(Json(result))
}

/// GET /api/agenda/bell: overdue and urgent items with the unread count.
pub async fn get_bell(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let records = tokio::task::spawn_blocking(move || OpportunityStore::new(root).load_all())
        .await
        .map_err(AppError::join)??;

    let bell = agenda::bell(&records, Utc::now(), &marks(&app));
    Ok(Json(serde_json::to_value(bell)?))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadBody {
    /// Item keys to mark; absent marks everything currently in the bell.
    pub keys: Option<Vec<String>>,
}

/// POST /api/agenda/bell/read: mark bell items read for today.
pub async fn mark_read(
    State(app): State<AppState>,
    Json(body): Json<MarkReadBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let records = tokio::task::spawn_blocking(move || OpportunityStore::new(root).load_all())
        .await
        .map_err(AppError::join)??;

    let now = Utc::now();
    let mut marks = marks(&app);
    match body.keys {
        Some(keys) => marks.mark_all(keys.iter().map(String::as_str), now),
        None => {
            let current = agenda::bell(&records, now, &marks);
            marks.mark_all(current.items.iter().map(|b| b.item.key.as_str()), now);
        }
    }
    let bell = agenda::bell(&records, now, &marks);
    Ok(Json(serde_json::to_value(bell)?))
}
