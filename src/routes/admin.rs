use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    dto::appointments::AppointmentList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Appointment, AppointmentStatus, Role, User},
    response::ApiResponse,
    routes::params::AppointmentListQuery,
    services::{admin_service, appointment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route("/appointments/qr/{qr_code}", get(resolve_qr))
        .route("/appointments/{id}/status", patch(update_appointment_status))
        .route("/users/{id}/role", patch(update_user_role))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRoleRequest {
    pub role: Role,
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "All appointments (admin only)", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp = admin_service::list_appointments(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments/qr/{qr_code}",
    params(("qr_code" = String, Path, description = "Token printed in the appointment QR code")),
    responses(
        (status = 200, description = "Appointment issued with this token", body = ApiResponse<Appointment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not a valid code"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn resolve_qr(
    State(state): State<AppState>,
    user: AuthUser,
    Path(qr_code): Path<String>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::resolve_qr(&state, &user, &qr_code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/appointments/{id}/status",
    params(("id" = i64, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentStatusRequest,
    responses(
        (status = 200, description = "Move an appointment along its lifecycle", body = ApiResponse<Appointment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Terminal status or backward move"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAppointmentStatusRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::update_status(&state, &user, id, payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRoleRequest,
    responses(
        (status = 200, description = "Assign a role", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::update_user_role(&state, &user, id, payload.role).await?;
    Ok(Json(resp))
}
