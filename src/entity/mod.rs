pub mod appointment_logs;
pub mod appointments;
pub mod audit_logs;
pub mod availability_slots;
pub mod users;

pub use appointment_logs::Entity as AppointmentLogs;
pub use appointments::Entity as Appointments;
pub use audit_logs::Entity as AuditLogs;
pub use availability_slots::Entity as AvailabilitySlots;
pub use users::Entity as Users;
