use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::appointments::AppointmentList,
    entity::{
        appointments::{Column as AppointmentCol, Entity as Appointments},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Role, User},
    response::{ApiResponse, Meta},
    routes::params::{AppointmentListQuery, SortOrder},
    services::{
        appointment_service::appointment_from_entity, availability_service,
        user_service::user_from_entity,
    },
    state::AppState,
};

pub async fn list_appointments(
    state: &AppState,
    user: &AuthUser,
    query: AppointmentListQuery,
) -> AppResult<ApiResponse<AppointmentList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(date) = query.date {
        condition = condition.add(AppointmentCol::AppointmentDate.eq(date));
    }
    if let Some(status) = query.status {
        condition = condition.add(AppointmentCol::Status.eq(status));
    }

    let mut finder = Appointments::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder
            .order_by_asc(AppointmentCol::StartTime)
            .order_by_asc(AppointmentCol::Id),
        SortOrder::Desc => finder
            .order_by_desc(AppointmentCol::StartTime)
            .order_by_desc(AppointmentCol::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(appointment_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Appointments",
        AppointmentList { items },
        Some(meta),
    ))
}

/// Changes a user's role. Promoting to host creates any missing slots of the
/// weekly grid; demoting leaves existing slots and appointments untouched.
pub async fn update_user_role(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    role: Role,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Users::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.role;

    let mut active: UserActive = existing.into();
    active.role = Set(role);
    let updated = active.update(&txn).await?;

    if role == Role::Host {
        availability_service::seed_template(&txn, updated.id, state.window).await?;
    }

    txn.commit().await?;

    tracing::info!(
        user_id = updated.id,
        from = previous.as_str(),
        to = role.as_str(),
        "user role updated"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "from": previous, "to": role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}
