use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        appointments::{AppointmentList, BookAppointmentRequest, Participation},
        auth::{LoginRequest, LoginResponse, SignupRequest},
        availability::{AvailabilityList, OpenSlotList, SetSlotStatusRequest, SlotCheck},
    },
    error::ErrorData,
    models::{
        Appointment, AppointmentLog, AppointmentStatus, AvailabilitySlot, OpenSlot, Role,
        SlotStatus, User, UserStats,
    },
    response::{ApiResponse, Meta},
    routes::{admin, appointments, auth, availability, health, params, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        availability::list_availability,
        availability::check_slot,
        availability::list_open_slots,
        availability::set_slot_status,
        appointments::book_appointment,
        appointments::get_appointment,
        appointments::cancel_appointment,
        appointments::get_visit_log,
        users::current_user,
        users::get_user,
        users::list_appointments,
        users::user_stats,
        admin::list_appointments,
        admin::resolve_qr,
        admin::update_appointment_status,
        admin::update_user_role
    ),
    components(
        schemas(
            User,
            Role,
            UserStats,
            AvailabilitySlot,
            SlotStatus,
            OpenSlot,
            Appointment,
            AppointmentStatus,
            AppointmentLog,
            Participation,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            SetSlotStatusRequest,
            BookAppointmentRequest,
            AvailabilityList,
            OpenSlotList,
            SlotCheck,
            AppointmentList,
            admin::UpdateAppointmentStatusRequest,
            admin::UpdateUserRoleRequest,
            params::Pagination,
            params::SortOrder,
            ErrorData,
            Meta,
            ApiResponse<Appointment>,
            ApiResponse<AppointmentList>,
            ApiResponse<AvailabilityList>,
            ApiResponse<OpenSlotList>,
            ApiResponse<ErrorData>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup and login by phone number"),
        (name = "Availability", description = "Weekly host availability"),
        (name = "Appointments", description = "Booking and appointment lifecycle"),
        (name = "Users", description = "User lookup, appointment history and stats"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
