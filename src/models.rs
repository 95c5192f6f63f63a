use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "visitor")]
    Visitor,
    #[sea_orm(string_value = "host")]
    Host,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Visitor => "visitor",
            Role::Host => "host",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "visitor" => Some(Role::Visitor),
            "host" => Some(Role::Host),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "not_available")]
    NotAvailable,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Ongoing => "ongoing",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    // Position along pending -> confirmed -> ongoing -> completed.
    fn progress(self) -> u8 {
        match self {
            AppointmentStatus::Pending => 0,
            AppointmentStatus::Confirmed => 1,
            AppointmentStatus::Ongoing => 2,
            AppointmentStatus::Completed => 3,
            AppointmentStatus::Cancelled => u8::MAX,
        }
    }

    /// Checks an admin-driven move from `self` to `next`.
    ///
    /// Returns `Ok(false)` when `next` equals the current status (nothing to
    /// write) and `Ok(true)` when the row must change. Terminal statuses reject
    /// everything, including a repeat of themselves. Any non-terminal status may
    /// be cancelled or moved forward, never backward.
    pub fn check_transition(self, next: AppointmentStatus) -> AppResult<bool> {
        if self.is_terminal() {
            return Err(AppError::AppointmentTerminal(self.to_string()));
        }
        if next == self {
            return Ok(false);
        }
        if next == AppointmentStatus::Cancelled || next.progress() > self.progress() {
            return Ok(true);
        }
        Err(AppError::InvalidTransition(format!("{self} -> {next}")))
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilitySlot {
    pub host_id: i64,
    pub day_of_week: i32,
    pub day_name: String,
    pub start_hour: i32,
    pub end_hour: i32,
    pub status: SlotStatus,
    pub updated_at: DateTime<Utc>,
}

/// A template slot projected onto a concrete calendar date.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OpenSlot {
    pub date: NaiveDate,
    pub day_of_week: i32,
    pub start_hour: i32,
    pub end_hour: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: i64,
    pub visitor_id: i64,
    pub host_id: i64,
    pub appointment_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentLog {
    pub appointment_id: i64,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, sqlx::FromRow, PartialEq, Eq)]
pub struct UserStats {
    pub hosted_count: i64,
    pub visited_count: i64,
    pub pending_count: i64,
}
