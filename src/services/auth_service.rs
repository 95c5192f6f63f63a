use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, SignupRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::jwt_secret,
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::{availability_service, user_service::user_from_entity},
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 24;

/// Registers a visitor or host. Hosts get their weekly grid created in the
/// same transaction, every slot starting as `not_available`.
pub async fn signup_user(
    state: &AppState,
    payload: SignupRequest,
) -> AppResult<ApiResponse<User>> {
    let SignupRequest {
        phone_number,
        first_name,
        last_name,
        role,
    } = payload;

    let phone_number = phone_number.trim().to_string();
    validate_phone_number(&phone_number)?;
    let first_name = required_name("first_name", &first_name)?;
    let last_name = required_name("last_name", &last_name)?;
    let role = role.unwrap_or(Role::Visitor);
    if role == Role::Admin {
        return Err(AppError::BadRequest(
            "admin accounts cannot be self-registered".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let taken = Users::find()
        .filter(UserCol::PhoneNumber.eq(phone_number.as_str()))
        .one(&txn)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest(
            "Phone number is already registered".into(),
        ));
    }

    let user = UserActive {
        id: NotSet,
        first_name: Set(first_name),
        last_name: Set(last_name),
        phone_number: Set(phone_number),
        role: Set(role),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if role == Role::Host {
        availability_service::seed_template(&txn, user.id, state.window).await?;
    }

    txn.commit().await?;

    tracing::info!(user_id = user.id, role = role.as_str(), "user signed up");
    audit::record(
        &state.pool,
        user.id,
        "user_signup",
        "users",
        serde_json::json!({ "user_id": user.id, "role": role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let phone_number = payload.phone_number.trim().to_string();
    let user = Users::find()
        .filter(UserCol::PhoneNumber.eq(phone_number.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown phone number".into()))?;

    let user = user_from_entity(user);
    let token = issue_token(&user)?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {token}"),
            user,
        },
        Some(Meta::empty()),
    ))
}

/// Signs a JWT carrying the user id and role.
pub fn issue_token(user: &User) -> AppResult<String> {
    let secret = jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// E.164: a `+` followed by 8 to 15 digits, the first of which is not zero.
fn validate_phone_number(phone_number: &str) -> AppResult<()> {
    let digits = phone_number.strip_prefix('+').unwrap_or_default();
    let valid = (8..=15).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0');
    if !valid {
        return Err(AppError::BadRequest(format!(
            "{phone_number:?} is not an E.164 phone number"
        )));
    }
    Ok(())
}

fn required_name(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}
