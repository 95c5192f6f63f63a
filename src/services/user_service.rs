use chrono::Utc;
use sea_orm::EntityTrait;

use crate::{
    entity::users::{Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    state::AppState,
};

pub async fn get_user(state: &AppState, id: i64) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(user_from_entity(user)))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    get_user(state, user.user_id).await
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        phone_number: model.phone_number,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
