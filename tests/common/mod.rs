#![allow(dead_code)]

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::{NotSet, Set};
use tokio::sync::Mutex;
use uuid::Uuid;
use visitor_booking_api::{
    calendar::{self, OperatingWindow},
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::SignupRequest,
    entity::users::ActiveModel as UserActive,
    middleware::auth::AuthUser,
    models::{Role, User},
    services::auth_service,
    state::AppState,
};

static MIGRATED: LazyLock<Mutex<bool>> = LazyLock::new(|| Mutex::new(false));

/// Builds state against `TEST_DATABASE_URL` / `DATABASE_URL`, or returns
/// `None` so the caller can skip when no database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 10).await?;
    let orm = create_orm_conn(&database_url).await?;

    {
        let mut migrated = MIGRATED.lock().await;
        if !*migrated {
            run_migrations(&orm).await?;
            *migrated = true;
        }
    }

    Ok(Some(AppState {
        pool,
        orm,
        window: OperatingWindow::default(),
    }))
}

/// A fresh E.164 number so tests never collide with each other or with
/// earlier runs against the same database.
pub fn unique_phone() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000_000;
    format!("+1{n:012}")
}

/// Registers a visitor or host through the signup flow.
pub async fn signup(state: &AppState, role: Role) -> anyhow::Result<(User, AuthUser)> {
    let resp = auth_service::signup_user(
        state,
        SignupRequest {
            phone_number: unique_phone(),
            first_name: "Test".into(),
            last_name: role.as_str().into(),
            role: Some(role),
        },
    )
    .await?;
    let user = resp.data.expect("signup returns the user");
    let auth = AuthUser {
        user_id: user.id,
        role: user.role,
    };
    Ok((user, auth))
}

/// Admins cannot sign up, so they are inserted directly.
pub async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let admin = UserActive {
        id: NotSet,
        first_name: Set("Test".into()),
        last_name: Set("Admin".into()),
        phone_number: Set(unique_phone()),
        role: Set(Role::Admin),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: admin.id,
        role: Role::Admin,
    })
}

/// First Monday strictly after today, so every hour on it lies in the future.
pub fn next_monday() -> NaiveDate {
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    calendar::next_occurrence(tomorrow, 1).expect("monday is a weekday")
}
