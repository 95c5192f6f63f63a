use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use crate::{
    audit,
    calendar::{self, OperatingWindow},
    dto::{
        appointments::BookAppointmentRequest,
        availability::{OpenSlotList, OpenSlotsQuery},
    },
    entity::{
        appointments::{
            ACTIVE_SLOT_INDEX, ActiveModel as AppointmentActive, Column as AppointmentCol,
            Entity as Appointments,
        },
        availability_slots::Model as SlotModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Appointment, AppointmentStatus, OpenSlot, SlotStatus},
    response::{ApiResponse, Meta},
    services::{
        appointment_service::{appointment_from_entity, issue_qr_token},
        availability_service,
    },
    state::AppState,
};

const DEFAULT_PROJECTION_DAYS: i64 = 7;
const MAX_PROJECTION_DAYS: i64 = 28;

/// Books `payload.start_hour` on `payload.date` with a host for the calling
/// visitor.
///
/// The availability check, the conflict check and the insert share one
/// transaction. The slot row is read under a shared lock and the partial unique
/// index on active appointments decides races: the losing request gets
/// `SlotAlreadyBooked` and nothing is written.
pub async fn book_appointment(
    state: &AppState,
    user: &AuthUser,
    payload: BookAppointmentRequest,
) -> AppResult<ApiResponse<Appointment>> {
    let BookAppointmentRequest {
        host_id,
        date,
        start_hour,
    } = payload;

    if user.user_id == host_id {
        return Err(AppError::SelfBookingDenied);
    }
    state.window.validate_hour(start_hour)?;
    let day_of_week = calendar::bookable_day_of_week(date)?;
    let (start, end) = calendar::slot_bounds(date, start_hour)?;
    if start <= Utc::now() {
        return Err(AppError::InvalidRange(format!(
            "{date} {} has already started",
            calendar::hour_label(start_hour)
        )));
    }

    let txn = state.orm.begin().await?;

    if !availability_service::is_available_locked(&txn, host_id, day_of_week, start_hour).await? {
        return Err(AppError::SlotUnavailable);
    }

    let clash = Appointments::find()
        .filter(
            Condition::all()
                .add(AppointmentCol::HostId.eq(host_id))
                .add(AppointmentCol::AppointmentDate.eq(date))
                .add(AppointmentCol::StartTime.eq(start))
                .add(AppointmentCol::EndTime.eq(end))
                .add(AppointmentCol::Status.ne(AppointmentStatus::Cancelled)),
        )
        .one(&txn)
        .await?;
    if clash.is_some() {
        return Err(AppError::SlotAlreadyBooked);
    }

    let appointment = AppointmentActive {
        id: NotSet,
        visitor_id: Set(user.user_id),
        host_id: Set(host_id),
        appointment_date: Set(date),
        start_time: Set(start.into()),
        end_time: Set(end.into()),
        status: Set(AppointmentStatus::Pending),
        qr_code: Set(Some(issue_qr_token())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(booking_conflict)?;

    txn.commit().await.map_err(booking_conflict)?;

    tracing::info!(
        appointment_id = appointment.id,
        visitor_id = user.user_id,
        host_id,
        %date,
        start_hour,
        "appointment booked"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "appointment_book",
        "appointments",
        serde_json::json!({
            "appointment_id": appointment.id,
            "host_id": host_id,
            "date": date,
            "start_hour": start_hour,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment booked",
        appointment_from_entity(appointment),
        Some(Meta::empty()),
    ))
}

/// Projects a host's weekly template onto concrete dates and drops the hours
/// that already carry an active appointment or have already started.
pub async fn list_open_slots(
    state: &AppState,
    host_id: i64,
    query: OpenSlotsQuery,
) -> AppResult<ApiResponse<OpenSlotList>> {
    let now = Utc::now();
    let (from, days, until) = projection_range(&query, now.date_naive())?;

    let template = availability_service::host_slots(&state.orm, host_id).await?;
    let booked: HashSet<(NaiveDate, i32)> = Appointments::find()
        .filter(
            Condition::all()
                .add(AppointmentCol::HostId.eq(host_id))
                .add(AppointmentCol::AppointmentDate.gte(from))
                .add(AppointmentCol::AppointmentDate.lt(until))
                .add(AppointmentCol::Status.ne(AppointmentStatus::Cancelled)),
        )
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|a| calendar::split_slot_start(a.start_time.with_timezone(&Utc)).ok())
        .collect();

    let items = project_template(&template, state.window, from, days, now, &booked);
    let meta = Meta::unpaged(items.len());
    Ok(ApiResponse::success(
        "Open slots",
        OpenSlotList { items },
        Some(meta),
    ))
}

/// Resolves the requested window to `(from, days, until)`, `until` exclusive.
fn projection_range(
    query: &OpenSlotsQuery,
    today: NaiveDate,
) -> AppResult<(NaiveDate, i64, NaiveDate)> {
    let from = query.from.unwrap_or(today);
    if from < today {
        return Err(AppError::InvalidRange(format!("{from} is in the past")));
    }
    let days = query.days.unwrap_or(DEFAULT_PROJECTION_DAYS);
    if !(1..=MAX_PROJECTION_DAYS).contains(&days) {
        return Err(AppError::InvalidRange(format!(
            "days must be between 1 and {MAX_PROJECTION_DAYS}"
        )));
    }
    let until = calendar::add_days(from, days)?;
    Ok((from, days, until))
}

fn project_template(
    template: &[SlotModel],
    window: OperatingWindow,
    from: NaiveDate,
    days: i64,
    now: DateTime<Utc>,
    booked: &HashSet<(NaiveDate, i32)>,
) -> Vec<OpenSlot> {
    let mut open = Vec::new();
    for date in (0..days).map_while(|offset| calendar::add_days(from, offset).ok()) {
        let Ok(day_of_week) = calendar::bookable_day_of_week(date) else {
            continue;
        };
        for slot in template.iter().filter(|s| {
            s.day_of_week == day_of_week
                && s.status == SlotStatus::Available
                && window.validate_hour(s.start_hour).is_ok()
        }) {
            if booked.contains(&(date, slot.start_hour)) {
                continue;
            }
            let Ok((start_time, end_time)) = calendar::slot_bounds(date, slot.start_hour) else {
                continue;
            };
            if start_time <= now {
                continue;
            }
            open.push(OpenSlot {
                date,
                day_of_week,
                start_hour: slot.start_hour,
                end_hour: slot.end_hour,
                start_time,
                end_time,
            });
        }
    }
    open
}

fn booking_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains(ACTIVE_SLOT_INDEX) => {
            AppError::SlotAlreadyBooked
        }
        _ => err.into(),
    }
}
