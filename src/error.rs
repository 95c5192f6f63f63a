use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Hosts cannot book appointments with themselves")]
    SelfBookingDenied,

    #[error("Slot is not available")]
    SlotUnavailable,

    #[error("Slot is already booked")]
    SlotAlreadyBooked,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Appointment is already {0} and cannot change")]
    AppointmentTerminal(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable identifier clients can branch on without parsing messages.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::InvalidRange(_) => "invalid_range",
            AppError::SelfBookingDenied => "self_booking_denied",
            AppError::SlotUnavailable => "slot_unavailable",
            AppError::SlotAlreadyBooked => "slot_already_booked",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::AppointmentTerminal(_) => "appointment_terminal",
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::SelfBookingDenied => StatusCode::BAD_REQUEST,
            AppError::InvalidRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::SlotUnavailable
            | AppError::SlotAlreadyBooked
            | AppError::InvalidTransition(_)
            | AppError::AppointmentTerminal(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorData {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                code: self.code().to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
