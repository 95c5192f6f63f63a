pub mod admin_service;
pub mod appointment_service;
pub mod auth_service;
pub mod availability_service;
pub mod booking_service;
pub mod stats_service;
pub mod user_service;
