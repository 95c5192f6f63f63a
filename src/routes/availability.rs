use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};

use crate::{
    dto::availability::{
        AvailabilityList, OpenSlotList, OpenSlotsQuery, SetSlotStatusRequest, SlotCheck,
        SlotCheckQuery,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::AvailabilitySlot,
    response::ApiResponse,
    services::{availability_service, booking_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{host_id}", get(list_availability))
        .route("/{host_id}/check", get(check_slot))
        .route("/{host_id}/open", get(list_open_slots))
        .route("/{host_id}/slots", put(set_slot_status))
}

#[utoipa::path(
    get,
    path = "/api/availability/{host_id}",
    params(("host_id" = i64, Path, description = "Host user ID")),
    responses(
        (status = 200, description = "Weekly availability template of a host", body = ApiResponse<AvailabilityList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Availability"
)]
pub async fn list_availability(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(host_id): Path<i64>,
) -> AppResult<Json<ApiResponse<AvailabilityList>>> {
    let resp = availability_service::list_availability(&state, host_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/availability/{host_id}/check",
    params(
        ("host_id" = i64, Path, description = "Host user ID"),
        SlotCheckQuery
    ),
    responses(
        (status = 200, description = "Whether one weekly slot is available", body = ApiResponse<SlotCheck>),
        (status = 422, description = "Day or hour outside the operating window"),
    ),
    security(("bearer_auth" = [])),
    tag = "Availability"
)]
pub async fn check_slot(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(host_id): Path<i64>,
    Query(query): Query<SlotCheckQuery>,
) -> AppResult<Json<ApiResponse<SlotCheck>>> {
    let resp = availability_service::check_slot(&state, host_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/availability/{host_id}/open",
    params(
        ("host_id" = i64, Path, description = "Host user ID"),
        OpenSlotsQuery
    ),
    responses(
        (status = 200, description = "Bookable dated slots of a host", body = ApiResponse<OpenSlotList>),
        (status = 422, description = "Range in the past or too long"),
    ),
    security(("bearer_auth" = [])),
    tag = "Availability"
)]
pub async fn list_open_slots(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(host_id): Path<i64>,
    Query(query): Query<OpenSlotsQuery>,
) -> AppResult<Json<ApiResponse<OpenSlotList>>> {
    let resp = booking_service::list_open_slots(&state, host_id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/availability/{host_id}/slots",
    params(("host_id" = i64, Path, description = "Host user ID")),
    request_body = SetSlotStatusRequest,
    responses(
        (status = 200, description = "Set the status of one weekly slot", body = ApiResponse<AvailabilitySlot>),
        (status = 403, description = "Not the host"),
        (status = 422, description = "Day or hour outside the operating window"),
    ),
    security(("bearer_auth" = [])),
    tag = "Availability"
)]
pub async fn set_slot_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(host_id): Path<i64>,
    Json(payload): Json<SetSlotStatusRequest>,
) -> AppResult<Json<ApiResponse<AvailabilitySlot>>> {
    let resp = availability_service::set_slot_status(&state, &user, host_id, payload).await?;
    Ok(Json(resp))
}
