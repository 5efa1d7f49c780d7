use crate::booking::BookingError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Request body could not be read as the expected JSON
    #[error("{message}")]
    BadRequest { message: String },

    /// Configuration rejected at startup
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Rejection from the booking workflow
    #[error(transparent)]
    Booking(#[from] BookingError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable code: `invalid-input`, `resource-locked`, `coordinator-unavailable`,
    /// `conflict`, `not-found` or `internal`
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Booking(e) => match e {
                BookingError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                BookingError::ResourceLocked(_) | BookingError::Conflict { .. } => StatusCode::CONFLICT,
                BookingError::CoordinatorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest { .. } => "invalid-input",
            Error::InvalidConfig { .. } => "internal",
            Error::Booking(e) => e.code(),
        }
    }

    /// Message safe to show to callers. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidConfig { .. } | Error::Booking(BookingError::Store(_)) => {
                "Internal server error".to_string()
            }
            Error::Booking(BookingError::CoordinatorUnavailable(_)) => {
                "Lock coordinator unavailable, try again later".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::InvalidConfig { .. } | Error::Booking(BookingError::Store(_)) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Booking(BookingError::CoordinatorUnavailable(source)) => {
                tracing::warn!("Coordinator unavailable: {}", source);
            }
            Error::Booking(BookingError::ResourceLocked(_) | BookingError::Conflict { .. }) => {
                tracing::info!("Booking rejected: {}", self);
            }
            Error::BadRequest { .. } | Error::Booking(BookingError::InvalidInput { .. } | BookingError::NotFound(_)) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest {
            message: format!("Invalid reservation id: {}", rejection.body_text()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
