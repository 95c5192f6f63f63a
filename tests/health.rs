use axum::{http::StatusCode, response::IntoResponse};
use visitor_booking_api::{error::AppError, routes::health::health_check};

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[test]
fn domain_errors_map_to_distinct_statuses() {
    let cases = [
        (AppError::InvalidRange("hour 8".into()), StatusCode::UNPROCESSABLE_ENTITY),
        (AppError::SelfBookingDenied, StatusCode::BAD_REQUEST),
        (AppError::SlotUnavailable, StatusCode::CONFLICT),
        (AppError::SlotAlreadyBooked, StatusCode::CONFLICT),
        (AppError::InvalidTransition("ongoing -> pending".into()), StatusCode::CONFLICT),
        (AppError::AppointmentTerminal("completed".into()), StatusCode::CONFLICT),
        (AppError::NotFound, StatusCode::NOT_FOUND),
        (AppError::Forbidden, StatusCode::FORBIDDEN),
    ];
    for (err, expected) in cases {
        assert_eq!(err.into_response().status(), expected);
    }
}

#[test]
fn error_codes_separate_not_found_from_conflicts() {
    assert_eq!(AppError::NotFound.code(), "not_found");
    assert_eq!(
        AppError::AppointmentTerminal("completed".into()).code(),
        "appointment_terminal"
    );
    assert_eq!(AppError::SlotAlreadyBooked.code(), "slot_already_booked");
}
