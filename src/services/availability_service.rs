use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

use crate::{
    audit,
    calendar::{self, OperatingWindow},
    dto::availability::{AvailabilityList, SetSlotStatusRequest, SlotCheck, SlotCheckQuery},
    entity::{
        availability_slots::{
            ActiveModel as SlotActive, Column as SlotCol, Entity as AvailabilitySlots,
            Model as SlotModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::{AvailabilitySlot, SlotStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Upserts the status of one weekly slot. Repeating the same status leaves the
/// slot unchanged; existing appointments are never touched.
pub async fn set_slot_status(
    state: &AppState,
    user: &AuthUser,
    host_id: i64,
    payload: SetSlotStatusRequest,
) -> AppResult<ApiResponse<AvailabilitySlot>> {
    ensure_self_or_admin(user, host_id)?;
    let SetSlotStatusRequest {
        day_of_week,
        start_hour,
        status,
    } = payload;
    state.window.validate_slot(day_of_week, start_hour)?;

    if user.user_id != host_id && Users::find_by_id(host_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let slot = AvailabilitySlots::insert(SlotActive {
        id: NotSet,
        host_id: Set(host_id),
        day_of_week: Set(day_of_week),
        start_hour: Set(start_hour),
        end_hour: Set(start_hour + 1),
        status: Set(status),
        updated_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([SlotCol::HostId, SlotCol::DayOfWeek, SlotCol::StartHour])
            .update_columns([SlotCol::Status, SlotCol::UpdatedAt])
            .to_owned(),
    )
    .exec_with_returning(&state.orm)
    .await?;

    tracing::debug!(host_id, day_of_week, start_hour, status = ?status, "slot status set");
    audit::record(
        &state.pool,
        user.user_id,
        "slot_status_set",
        "availability_slots",
        serde_json::json!({
            "host_id": host_id,
            "day_of_week": day_of_week,
            "start_hour": start_hour,
            "status": status,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Slot updated",
        slot_from_entity(slot),
        Some(Meta::empty()),
    ))
}

pub async fn list_availability(
    state: &AppState,
    host_id: i64,
) -> AppResult<ApiResponse<AvailabilityList>> {
    let items: Vec<AvailabilitySlot> = host_slots(&state.orm, host_id)
        .await?
        .into_iter()
        .map(slot_from_entity)
        .collect();

    let meta = Meta::unpaged(items.len());
    Ok(ApiResponse::success(
        "Availability",
        AvailabilityList { items },
        Some(meta),
    ))
}

pub async fn check_slot(
    state: &AppState,
    host_id: i64,
    query: SlotCheckQuery,
) -> AppResult<ApiResponse<SlotCheck>> {
    state.window.validate_slot(query.day_of_week, query.hour)?;
    let available = is_available(&state.orm, host_id, query.day_of_week, query.hour).await?;

    Ok(ApiResponse::ok(SlotCheck {
        host_id,
        day_of_week: query.day_of_week,
        start_hour: query.hour,
        available,
    }))
}

/// Every configured slot of a host, ordered by weekday then hour.
pub async fn host_slots<C: ConnectionTrait>(conn: &C, host_id: i64) -> AppResult<Vec<SlotModel>> {
    let slots = AvailabilitySlots::find()
        .filter(SlotCol::HostId.eq(host_id))
        .order_by_asc(SlotCol::DayOfWeek)
        .order_by_asc(SlotCol::StartHour)
        .all(conn)
        .await?;
    Ok(slots)
}

pub async fn is_available<C: ConnectionTrait>(
    conn: &C,
    host_id: i64,
    day_of_week: i32,
    hour: i32,
) -> AppResult<bool> {
    slot_is_available(conn, host_id, day_of_week, hour, false).await
}

/// Same as [`is_available`] but holds a shared lock on the slot row until the
/// surrounding transaction ends, so a concurrent status edit waits for it.
pub async fn is_available_locked<C: ConnectionTrait>(
    conn: &C,
    host_id: i64,
    day_of_week: i32,
    hour: i32,
) -> AppResult<bool> {
    slot_is_available(conn, host_id, day_of_week, hour, true).await
}

async fn slot_is_available<C: ConnectionTrait>(
    conn: &C,
    host_id: i64,
    day_of_week: i32,
    hour: i32,
    lock: bool,
) -> AppResult<bool> {
    let mut finder = AvailabilitySlots::find().filter(
        Condition::all()
            .add(SlotCol::HostId.eq(host_id))
            .add(SlotCol::DayOfWeek.eq(day_of_week))
            .add(SlotCol::StartHour.eq(hour)),
    );
    if lock {
        finder = finder.lock(LockType::Share);
    }

    let slot = finder.one(conn).await?;
    Ok(slot.is_some_and(|s| s.status == SlotStatus::Available))
}

/// Creates the full weekday grid for a host, every slot `not_available`.
/// Slots that already exist keep their status.
pub async fn seed_template<C: ConnectionTrait>(
    conn: &C,
    host_id: i64,
    window: OperatingWindow,
) -> AppResult<()> {
    let now = Utc::now();
    let rows: Vec<SlotActive> = calendar::weekdays()
        .flat_map(|day| window.hours().map(move |hour| (day, hour)))
        .map(|(day, hour)| SlotActive {
            id: NotSet,
            host_id: Set(host_id),
            day_of_week: Set(day),
            start_hour: Set(hour),
            end_hour: Set(hour + 1),
            status: Set(SlotStatus::NotAvailable),
            updated_at: Set(now.into()),
        })
        .collect();

    AvailabilitySlots::insert_many(rows)
        .on_conflict(
            OnConflict::columns([SlotCol::HostId, SlotCol::DayOfWeek, SlotCol::StartHour])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(conn)
        .await?;

    tracing::debug!(host_id, "availability template seeded");
    Ok(())
}

pub(crate) fn slot_from_entity(model: SlotModel) -> AvailabilitySlot {
    AvailabilitySlot {
        host_id: model.host_id,
        day_of_week: model.day_of_week,
        day_name: calendar::weekday_name(model.day_of_week)
            .unwrap_or_default()
            .to_string(),
        start_hour: model.start_hour,
        end_hour: model.end_hour,
        status: model.status,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
