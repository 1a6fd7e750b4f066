use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pipeline_core::PipelineError;

// ---------------------------------------------------------------------------
// Sentinel for explicit 400 errors raised by the HTTP layer itself
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::OpportunityNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::NotInitialized
        | PipelineError::UnknownTaxonomy(_)
        | PipelineError::InvalidStage { .. } => StatusCode::BAD_REQUEST,
        PipelineError::DragInProgress(_)
        | PipelineError::NoActiveDrag
        | PipelineError::UpdateRejected(_) => StatusCode::CONFLICT,
        PipelineError::Fetch(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Io(_) | PipelineError::Yaml(_) | PipelineError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<BadRequestError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if let Some(e) = self.0.downcast_ref::<PipelineError>() {
            status_for(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
