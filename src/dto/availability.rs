use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{AvailabilitySlot, OpenSlot, SlotStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetSlotStatusRequest {
    pub day_of_week: i32,
    pub start_hour: i32,
    pub status: SlotStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityList {
    pub items: Vec<AvailabilitySlot>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotCheckQuery {
    pub day_of_week: i32,
    pub hour: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotCheck {
    pub host_id: i64,
    pub day_of_week: i32,
    pub start_hour: i32,
    pub available: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OpenSlotsQuery {
    /// First date to consider, defaults to today (UTC).
    pub from: Option<NaiveDate>,
    /// Number of days to project, 1..=28, default 7.
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpenSlotList {
    pub items: Vec<OpenSlot>,
}
