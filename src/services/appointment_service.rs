use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::appointments::{AppointmentList, Participation},
    entity::{
        appointment_logs::{
            ActiveModel as LogActive, Column as LogCol, Entity as AppointmentLogs,
            Model as LogModel,
        },
        appointments::{
            ActiveModel as AppointmentActive, Column as AppointmentCol, Entity as Appointments,
            Model as AppointmentModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::{Appointment, AppointmentLog, AppointmentStatus},
    response::{ApiResponse, Meta},
    state::AppState,
};

// Longer tokens than this were never issued.
const MAX_QR_TOKEN_LEN: usize = 64;

/// Opaque QR token: 32 lowercase hex chars from a random v4 UUID, unrelated to
/// the appointment id.
pub fn issue_qr_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub async fn get_appointment(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Appointment>> {
    let appointment = Appointments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_participant_or_admin(user, &appointment)?;

    Ok(ApiResponse::ok(appointment_from_entity(appointment)))
}

/// Visitor- or host-initiated cancellation of a pending appointment.
pub async fn cancel_appointment(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Appointment>> {
    let txn = state.orm.begin().await?;
    let existing = lock_appointment(&txn, id).await?;

    if user.user_id != existing.visitor_id && user.user_id != existing.host_id {
        return Err(AppError::InvalidTransition(
            "only the visitor or the host may cancel an appointment".into(),
        ));
    }
    if existing.status != AppointmentStatus::Pending {
        return Err(AppError::InvalidTransition(format!(
            "cannot cancel an appointment that is {}",
            existing.status
        )));
    }

    let mut active: AppointmentActive = existing.into();
    active.status = Set(AppointmentStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    let appointment = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        appointment_id = appointment.id,
        requester_id = user.user_id,
        "appointment cancelled"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "appointment_cancel",
        "appointments",
        serde_json::json!({ "appointment_id": appointment.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment cancelled",
        appointment_from_entity(appointment),
        Some(Meta::empty()),
    ))
}

/// Looks up an appointment by the exact token printed in its QR code.
pub async fn resolve_qr(
    state: &AppState,
    user: &AuthUser,
    qr_code: &str,
) -> AppResult<ApiResponse<Appointment>> {
    ensure_admin(user)?;
    if qr_code.is_empty() || qr_code.len() > MAX_QR_TOKEN_LEN {
        return Err(AppError::NotFound);
    }

    let appointment = Appointments::find()
        .filter(AppointmentCol::QrCode.eq(qr_code))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Appointment found",
        appointment_from_entity(appointment),
        Some(Meta::empty()),
    ))
}

/// Admin-driven status change. See [`AppointmentStatus::check_transition`]
/// for the allowed moves. Entering `ongoing` stamps the visit check-in and
/// entering `completed` stamps the check-out, in the same transaction.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    new_status: AppointmentStatus,
) -> AppResult<ApiResponse<Appointment>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = lock_appointment(&txn, id).await?;
    let previous = existing.status;

    if !previous.check_transition(new_status)? {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Status unchanged",
            appointment_from_entity(existing),
            Some(Meta::empty()),
        ));
    }

    let now = Utc::now();
    let mut active: AppointmentActive = existing.into();
    active.status = Set(new_status);
    active.updated_at = Set(now.into());
    let appointment = active.update(&txn).await?;

    stamp_visit_log(&txn, appointment.id, new_status, now).await?;

    txn.commit().await?;

    tracing::info!(
        appointment_id = appointment.id,
        from = %previous,
        to = %new_status,
        "appointment status updated"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "appointment_status_update",
        "appointments",
        serde_json::json!({
            "appointment_id": appointment.id,
            "from": previous,
            "to": new_status,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment updated",
        appointment_from_entity(appointment),
        Some(Meta::empty()),
    ))
}

pub async fn list_for_user(
    state: &AppState,
    user: &AuthUser,
    user_id: i64,
    participation: Participation,
) -> AppResult<ApiResponse<AppointmentList>> {
    ensure_self_or_admin(user, user_id)?;

    let column = match participation {
        Participation::Visitor => AppointmentCol::VisitorId,
        Participation::Host => AppointmentCol::HostId,
    };
    let items: Vec<Appointment> = Appointments::find()
        .filter(column.eq(user_id))
        .order_by_desc(AppointmentCol::StartTime)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(appointment_from_entity)
        .collect();

    let meta = Meta::unpaged(items.len());
    Ok(ApiResponse::success(
        "Appointments",
        AppointmentList { items },
        Some(meta),
    ))
}

pub async fn get_visit_log(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<AppointmentLog>> {
    let appointment = Appointments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_participant_or_admin(user, &appointment)?;

    let log = AppointmentLogs::find()
        .filter(LogCol::AppointmentId.eq(id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::ok(log_from_entity(log)))
}

async fn lock_appointment(txn: &DatabaseTransaction, id: i64) -> AppResult<AppointmentModel> {
    Appointments::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

async fn stamp_visit_log<C: ConnectionTrait>(
    conn: &C,
    appointment_id: i64,
    status: AppointmentStatus,
    at: DateTime<Utc>,
) -> AppResult<()> {
    let (check_in, check_out) = match status {
        AppointmentStatus::Ongoing => (Some(at), None),
        AppointmentStatus::Completed => (None, Some(at)),
        _ => return Ok(()),
    };

    let existing = AppointmentLogs::find()
        .filter(LogCol::AppointmentId.eq(appointment_id))
        .one(conn)
        .await?;

    match existing {
        Some(log) => {
            let keep_check_in = log.check_in_time.is_some();
            let mut active: LogActive = log.into();
            let mut changed = false;
            if let Some(at) = check_in.filter(|_| !keep_check_in) {
                active.check_in_time = Set(Some(at.into()));
                changed = true;
            }
            if let Some(at) = check_out {
                active.check_out_time = Set(Some(at.into()));
                changed = true;
            }
            if changed {
                active.update(conn).await?;
            }
        }
        None => {
            LogActive {
                id: NotSet,
                appointment_id: Set(appointment_id),
                check_in_time: Set(check_in.map(Into::into)),
                check_out_time: Set(check_out.map(Into::into)),
                created_at: NotSet,
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(())
}

fn ensure_participant_or_admin(user: &AuthUser, appointment: &AppointmentModel) -> AppResult<()> {
    if user.is_admin()
        || user.user_id == appointment.visitor_id
        || user.user_id == appointment.host_id
    {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub(crate) fn appointment_from_entity(model: AppointmentModel) -> Appointment {
    Appointment {
        id: model.id,
        visitor_id: model.visitor_id,
        host_id: model.host_id,
        appointment_date: model.appointment_date,
        start_time: model.start_time.with_timezone(&Utc),
        end_time: model.end_time.with_timezone(&Utc),
        status: model.status,
        qr_code: model.qr_code,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn log_from_entity(model: LogModel) -> AppointmentLog {
    AppointmentLog {
        appointment_id: model.appointment_id,
        check_in_time: model.check_in_time.map(|dt| dt.with_timezone(&Utc)),
        check_out_time: model.check_out_time.map(|dt| dt.with_timezone(&Utc)),
    }
}
