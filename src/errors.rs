use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::{source_error_message, PipelineError};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ApiError,
}

impl AppError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ApiError {
                code: "INTERNAL_ERROR".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ApiError {
                code: "UNAUTHORIZED".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            body: ApiError {
                code: "FORBIDDEN".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ApiError {
                code: "SERVICE_UNAVAILABLE".into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    /// Maps a failed run for the API routes. Fetch failures carry the raw
    /// driver text; everything else stays generic.
    pub fn from_pipeline(err: PipelineError, table: &str) -> Self {
        match err {
            PipelineError::Source(ref e) => Self::service_unavailable(source_error_message(table, e)),
            other => other.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        tracing::error!("Pipeline error: {:?}", err);
        Self::internal("Forecast generation failed")
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        tracing::error!("CSV export error: {:?}", err);
        Self::internal("CSV export failed")
    }
}
