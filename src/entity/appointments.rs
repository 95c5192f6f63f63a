use sea_orm::entity::prelude::*;

use crate::models::AppointmentStatus;

/// Partial unique index over (host_id, appointment_date, start_time, end_time)
/// for rows that are not cancelled.
pub const ACTIVE_SLOT_INDEX: &str = "appointments_active_slot_key";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub visitor_id: i64,
    pub host_id: i64,
    pub appointment_date: Date,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: DateTimeWithTimeZone,
    pub status: AppointmentStatus,
    #[sea_orm(unique)]
    pub qr_code: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::VisitorId",
        to = "super::users::Column::Id"
    )]
    Visitor,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::HostId",
        to = "super::users::Column::Id"
    )]
    Host,
    #[sea_orm(has_one = "super::appointment_logs::Entity")]
    AppointmentLog,
}

impl Related<super::appointment_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppointmentLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
