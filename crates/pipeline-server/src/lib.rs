pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    router(state::AppState::new(root))
}

/// Router over an existing state, so callers can hold on to its hub.
pub fn router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Invalidation stream (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Records
        .route(
            "/api/opportunities",
            get(routes::opportunities::list_opportunities),
        )
        .route(
            "/api/opportunities/{id}",
            get(routes::opportunities::get_opportunity)
                .patch(routes::opportunities::update_stage),
        )
        // Boards
        .route("/api/boards/{taxonomy}", get(routes::boards::get_board))
        .route("/api/catalog/{taxonomy}", get(routes::boards::get_catalog))
        // Agenda
        .route("/api/agenda/events", get(routes::agenda::list_events))
        .route("/api/agenda/calendar", get(routes::agenda::get_calendar))
        .route("/api/agenda/bell", get(routes::agenda::get_bell))
        .route("/api/agenda/bell/read", post(routes::agenda::mark_read))
        // Config
        .route("/api/config", get(routes::config::get_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the pipeline server on `port`.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener, open_browser).await
}

/// Start the pipeline server on a pre-bound listener.
///
/// Lets the caller read the actual port first when binding port 0.
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = state::AppState::new(root);
    let watcher = app_state.spawn_store_watcher();
    let app = router(app_state);

    tracing::info!("pipeline server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/boards/primary");
        let _ = open::that(&url);
    }

    let served = axum::serve(listener, app).await;
    watcher.abort();
    served?;
    Ok(())
}
