use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use research_agents::AgentError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or incomplete request, rejected before any agent runs.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Agent(e) if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Agent(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::debug!("Request rejected: {}", self);
        }
        HttpResponse::build(status_code).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}
