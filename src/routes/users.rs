use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::appointments::{AppointmentList, ParticipationQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{User, UserStats},
    response::ApiResponse,
    services::{appointment_service, stats_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(current_user))
        .route("/{id}", get(get_user))
        .route("/{id}/appointments", get(list_appointments))
        .route("/{id}/stats", get(user_stats))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::current_user(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Look up a user", body = ApiResponse<User>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_user(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/appointments",
    params(
        ("id" = i64, Path, description = "User ID"),
        ParticipationQuery
    ),
    responses(
        (status = 200, description = "Appointments the user visits or hosts", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Query(query): Query<ParticipationQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp = appointment_service::list_for_user(&state, &user, id, query.role).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/stats",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Hosted, visited and pending counts", body = ApiResponse<UserStats>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn user_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let resp = stats_service::user_stats(&state, &user, id).await?;
    Ok(Json(resp))
}
