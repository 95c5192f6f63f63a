use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::Appointment;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookAppointmentRequest {
    pub host_id: i64,
    pub date: NaiveDate,
    pub start_hour: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentList {
    pub items: Vec<Appointment>,
}

/// Which side of an appointment a user is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Participation {
    Visitor,
    Host,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ParticipationQuery {
    pub role: Participation,
}
