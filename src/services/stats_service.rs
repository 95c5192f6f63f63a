use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::UserStats,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Dashboard counters for one user, recomputed from the appointments table on
/// every read.
pub async fn user_stats(
    state: &AppState,
    user: &AuthUser,
    user_id: i64,
) -> AppResult<ApiResponse<UserStats>> {
    ensure_self_or_admin(user, user_id)?;

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let stats = count_appointments(&state.pool, user_id).await?;
    Ok(ApiResponse::success("User stats", stats, Some(Meta::empty())))
}

pub async fn count_appointments(pool: &DbPool, user_id: i64) -> AppResult<UserStats> {
    let stats = sqlx::query_as::<_, UserStats>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE host_id = $1) AS hosted_count,
            COUNT(*) FILTER (WHERE visitor_id = $1) AS visited_count,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending_count
        FROM appointments
        WHERE host_id = $1 OR visitor_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
