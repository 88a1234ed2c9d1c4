//! Error taxonomy shared by the services and the HTTP layer.
//!
//! Services return [`ServiceError`]; handlers return it as-is and the
//! [`IntoResponse`] impl decides the status code and the client-visible text.
//! Database detail is logged here and never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed input, checked before any write.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    /// Referenced row does not exist (or is not visible to the caller).
    #[error("{0}")]
    NotFound(String),
    /// Status precondition not met. Reported like `NotFound` at the boundary.
    #[error("{0}")]
    InvalidState(String),
    #[error("seats already reserved for this showtime: {0:?}")]
    SeatsTaken(Vec<i64>),
    /// A write inside the booking transaction failed; everything was rolled back.
    #[error("booking transaction failed: {0}")]
    Transaction(#[source] sqlx::Error),
    #[error("database error: {0}")]
    Internal(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    #[serde(rename = "seatIDs", skip_serializing_if = "Option::is_none")]
    pub seat_ids: Option<Vec<i64>>,
}

pub type ApiResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) | ServiceError::InvalidState(_) => StatusCode::NOT_FOUND,
            ServiceError::SeatsTaken(_) => StatusCode::CONFLICT,
            ServiceError::Transaction(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Transaction(_) => "Booking failed".to_string(),
            ServiceError::Internal(_) => "Internal server error".to_string(),
            ServiceError::SeatsTaken(_) => {
                "Some of the selected seats are already booked for this showtime".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        } else {
            tracing::debug!("request rejected ({}): {}", status, self);
        }

        let seat_ids = match &self {
            ServiceError::SeatsTaken(ids) => Some(ids.clone()),
            _ => None,
        };
        let body = ApiError { success: false, error: self.public_message(), seat_ids };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        if messages.is_empty() {
            messages.push("Invalid request".to_string());
        }
        ServiceError::Validation(messages.join("; "))
    }
}
