use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Role, User};

#[derive(Deserialize, Debug, ToSchema)]
pub struct SignupRequest {
    /// E.164 formatted, e.g. `+4915112345678`.
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    /// `visitor` (default) or `host`. Admins are assigned, never self-registered.
    pub role: Option<Role>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub phone_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
