use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE stream that emits `update` whenever the record set changes.
///
/// A lagging client still gets an `update`: the payload carries nothing, and
/// one refetch covers every signal it missed.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.hub.sender().subscribe();
    tracing::debug!("invalidation stream opened");
    let stream = BroadcastStream::new(rx)
        .map(|_| Ok::<Event, Infallible>(Event::default().event("update").data("update")));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
