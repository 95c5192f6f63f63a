use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::appointments::BookAppointmentRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Appointment, AppointmentLog},
    response::ApiResponse,
    services::{appointment_service, booking_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(book_appointment))
        .route("/{id}", get(get_appointment))
        .route("/{id}/cancel", post(cancel_appointment))
        .route("/{id}/log", get(get_visit_log))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Book a slot with a host", body = ApiResponse<Appointment>),
        (status = 400, description = "Self-booking"),
        (status = 409, description = "Slot unavailable or already booked"),
        (status = 422, description = "Date or hour outside the bookable range"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn book_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BookAppointmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    let resp = booking_service::book_appointment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Get an appointment", body = ApiResponse<Appointment>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::get_appointment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/cancel",
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Cancel a pending appointment", body = ApiResponse<Appointment>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Not pending or not a participant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::cancel_appointment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}/log",
    params(("id" = i64, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Check-in and check-out times", body = ApiResponse<AppointmentLog>),
        (status = 404, description = "Not Found or visit not started"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn get_visit_log(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<AppointmentLog>>> {
    let resp = appointment_service::get_visit_log(&state, &user, id).await?;
    Ok(Json(resp))
}
