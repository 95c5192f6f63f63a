mod common;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use visitor_booking_api::{
    dto::{
        appointments::{BookAppointmentRequest, Participation},
        auth::{LoginRequest, SignupRequest},
        availability::{OpenSlotsQuery, SetSlotStatusRequest, SlotCheckQuery},
    },
    entity::audit_logs::{Column as AuditCol, Entity as AuditLogs},
    error::AppError,
    middleware::auth::AuthUser,
    models::{AppointmentStatus, Role, SlotStatus, UserStats},
    routes::params::AppointmentListQuery,
    services::{
        admin_service, appointment_service, auth_service, availability_service, booking_service,
        stats_service,
    },
    state::AppState,
};

async fn open_slot(
    state: &AppState,
    host: &AuthUser,
    day_of_week: i32,
    hour: i32,
) -> anyhow::Result<()> {
    availability_service::set_slot_status(
        state,
        host,
        host.user_id,
        SetSlotStatusRequest {
            day_of_week,
            start_hour: hour,
            status: SlotStatus::Available,
        },
    )
    .await?;
    Ok(())
}

// Host opens Monday 09:00, a visitor books it, the admin scans the QR code and
// walks the appointment to completed.
#[tokio::test]
async fn monday_morning_visit_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (_, host) = common::signup(&state, Role::Host).await?;
    let (_, visitor) = common::signup(&state, Role::Visitor).await?;
    let admin = common::create_admin(&state).await?;
    let monday = common::next_monday();

    // Signup seeded the whole grid as not_available.
    let template = availability_service::list_availability(&state, host.user_id)
        .await?
        .data
        .expect("availability");
    assert_eq!(template.items.len(), 5 * 9);
    assert!(
        template
            .items
            .iter()
            .all(|s| s.status == SlotStatus::NotAvailable)
    );

    // Setting the same status twice is a no-op.
    open_slot(&state, &host, 1, 9).await?;
    open_slot(&state, &host, 1, 9).await?;
    let check = availability_service::check_slot(
        &state,
        host.user_id,
        SlotCheckQuery {
            day_of_week: 1,
            hour: 9,
        },
    )
    .await?
    .data
    .expect("slot check");
    assert!(check.available);
    let template = availability_service::list_availability(&state, host.user_id)
        .await?
        .data
        .expect("availability");
    assert_eq!(template.items.len(), 5 * 9);
    assert_eq!(
        template
            .items
            .iter()
            .filter(|s| s.status == SlotStatus::Available)
            .count(),
        1
    );

    let booked = booking_service::book_appointment(
        &state,
        &visitor,
        BookAppointmentRequest {
            host_id: host.user_id,
            date: monday,
            start_hour: 9,
        },
    )
    .await?
    .data
    .expect("appointment");
    assert_eq!(booked.status, AppointmentStatus::Pending);
    assert_eq!(booked.appointment_date, monday);
    assert_eq!(booked.end_time - booked.start_time, Duration::hours(1));
    let qr = booked.qr_code.clone().expect("qr issued at creation");
    assert_ne!(qr, booked.id.to_string());

    // Booking consumes the date, not the weekly template.
    let check = availability_service::check_slot(
        &state,
        host.user_id,
        SlotCheckQuery {
            day_of_week: 1,
            hour: 9,
        },
    )
    .await?
    .data
    .expect("slot check");
    assert!(check.available);

    let resolved = appointment_service::resolve_qr(&state, &admin, &qr)
        .await?
        .data
        .expect("resolved");
    assert_eq!(resolved.id, booked.id);

    // Only the exact token resolves.
    let mut rejected = vec![
        appointment_service::issue_qr_token(),
        qr[..16].to_string(),
        String::new(),
        "a".repeat(65),
        format!("{qr}0"),
    ];
    let shouted = qr.to_uppercase();
    if shouted != qr {
        rejected.push(shouted);
    }
    for token in &rejected {
        assert!(
            matches!(
                appointment_service::resolve_qr(&state, &admin, token).await,
                Err(AppError::NotFound)
            ),
            "token {token:?} should not resolve"
        );
    }
    assert!(matches!(
        appointment_service::resolve_qr(&state, &visitor, &qr).await,
        Err(AppError::Forbidden)
    ));

    let stats = stats_service::user_stats(&state, &visitor, visitor.user_id)
        .await?
        .data
        .expect("stats");
    assert_eq!(
        stats,
        UserStats {
            hosted_count: 0,
            visited_count: 1,
            pending_count: 1,
        }
    );

    let ongoing = appointment_service::update_status(
        &state,
        &admin,
        booked.id,
        AppointmentStatus::Ongoing,
    )
    .await?
    .data
    .expect("ongoing");
    assert_eq!(ongoing.status, AppointmentStatus::Ongoing);

    let completed = appointment_service::update_status(
        &state,
        &admin,
        booked.id,
        AppointmentStatus::Completed,
    )
    .await?
    .data
    .expect("completed");
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let log = appointment_service::get_visit_log(&state, &visitor, booked.id)
        .await?
        .data
        .expect("visit log");
    let check_in = log.check_in_time.expect("check-in stamped");
    let check_out = log.check_out_time.expect("check-out stamped");
    assert!(check_out >= check_in);

    // Stats see the transition immediately.
    let stats = stats_service::user_stats(&state, &host, host.user_id)
        .await?
        .data
        .expect("stats");
    assert_eq!(
        stats,
        UserStats {
            hosted_count: 1,
            visited_count: 0,
            pending_count: 0,
        }
    );

    for next in [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Ongoing,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ] {
        let err = appointment_service::update_status(&state, &admin, booked.id, next)
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::AppointmentTerminal(_)),
            "completed -> {next} gave {err:?}"
        );
    }

    let audit = AuditLogs::find()
        .filter(AuditCol::UserId.eq(visitor.user_id))
        .filter(AuditCol::Action.eq("appointment_book"))
        .one(&state.orm)
        .await?;
    assert!(audit.is_some());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_for_one_slot_succeed_once() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (_, host) = common::signup(&state, Role::Host).await?;
    open_slot(&state, &host, 1, 10).await?;
    let monday = common::next_monday();

    let mut visitors = Vec::new();
    for _ in 0..8 {
        visitors.push(common::signup(&state, Role::Visitor).await?.1);
    }

    let mut handles = Vec::new();
    for visitor in visitors {
        let state = state.clone();
        let host_id = host.user_id;
        handles.push(tokio::spawn(async move {
            booking_service::book_appointment(
                &state,
                &visitor,
                BookAppointmentRequest {
                    host_id,
                    date: monday,
                    start_hour: 10,
                },
            )
            .await
        }));
    }

    let mut booked = 0;
    let mut already_booked = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => booked += 1,
            Err(AppError::SlotAlreadyBooked) => already_booked += 1,
            Err(other) => panic!("unexpected booking error: {other:?}"),
        }
    }
    assert_eq!(booked, 1);
    assert_eq!(already_booked, 7);

    let stats = stats_service::count_appointments(&state.pool, host.user_id).await?;
    assert_eq!(stats.hosted_count, 1);

    Ok(())
}

#[tokio::test]
async fn booking_rejections() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (_, host) = common::signup(&state, Role::Host).await?;
    let (_, visitor) = common::signup(&state, Role::Visitor).await?;
    let monday = common::next_monday();
    let host_id = host.user_id;
    let book = |user: AuthUser, date: NaiveDate, start_hour: i32| {
        let state = state.clone();
        async move {
            booking_service::book_appointment(
                &state,
                &user,
                BookAppointmentRequest {
                    host_id,
                    date,
                    start_hour,
                },
            )
            .await
        }
    };

    // Template slots start out not_available.
    assert!(matches!(
        book(visitor.clone(), monday, 11).await,
        Err(AppError::SlotUnavailable)
    ));

    open_slot(&state, &host, 1, 11).await?;
    assert!(matches!(
        book(host.clone(), monday, 11).await,
        Err(AppError::SelfBookingDenied)
    ));
    assert!(matches!(
        book(visitor.clone(), monday + Duration::days(5), 11).await,
        Err(AppError::InvalidRange(_))
    ));
    assert!(matches!(
        book(visitor.clone(), monday, 18).await,
        Err(AppError::InvalidRange(_))
    ));
    assert!(matches!(
        book(visitor.clone(), monday - Duration::days(14), 11).await,
        Err(AppError::InvalidRange(_))
    ));

    book(visitor.clone(), monday, 11).await?;
    assert!(matches!(
        book(visitor.clone(), monday, 11).await,
        Err(AppError::SlotAlreadyBooked)
    ));

    // Rejected attempts left nothing behind.
    let stats = stats_service::count_appointments(&state.pool, visitor.user_id).await?;
    assert_eq!(stats.visited_count, 1);

    Ok(())
}

#[tokio::test]
async fn only_participants_cancel_pending_appointments() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (_, host) = common::signup(&state, Role::Host).await?;
    let (_, visitor) = common::signup(&state, Role::Visitor).await?;
    let (_, stranger) = common::signup(&state, Role::Visitor).await?;
    let admin = common::create_admin(&state).await?;
    open_slot(&state, &host, 1, 13).await?;
    let monday = common::next_monday();
    let request = BookAppointmentRequest {
        host_id: host.user_id,
        date: monday,
        start_hour: 13,
    };

    let booked = booking_service::book_appointment(&state, &visitor, request.clone())
        .await?
        .data
        .expect("appointment");

    assert!(matches!(
        appointment_service::cancel_appointment(&state, &stranger, booked.id).await,
        Err(AppError::InvalidTransition(_))
    ));
    assert!(matches!(
        appointment_service::get_appointment(&state, &stranger, booked.id).await,
        Err(AppError::Forbidden)
    ));

    let cancelled = appointment_service::cancel_appointment(&state, &host, booked.id)
        .await?
        .data
        .expect("cancelled");
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    assert!(matches!(
        appointment_service::cancel_appointment(&state, &visitor, booked.id).await,
        Err(AppError::InvalidTransition(_))
    ));
    assert!(matches!(
        appointment_service::update_status(&state, &admin, booked.id, AppointmentStatus::Pending)
            .await,
        Err(AppError::AppointmentTerminal(_))
    ));
    assert!(matches!(
        appointment_service::cancel_appointment(&state, &visitor, i64::MAX).await,
        Err(AppError::NotFound)
    ));

    // A cancelled booking frees the date for someone else.
    let rebooked = booking_service::book_appointment(&state, &stranger, request)
        .await?
        .data
        .expect("rebooked");
    assert_ne!(rebooked.id, booked.id);
    assert_ne!(rebooked.qr_code, booked.qr_code);

    let hosted = appointment_service::list_for_user(
        &state,
        &host,
        host.user_id,
        Participation::Host,
    )
    .await?
    .data
    .expect("hosted");
    assert_eq!(hosted.items.len(), 2);

    Ok(())
}

#[tokio::test]
async fn confirmed_is_reachable_and_moves_are_forward_only() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (_, host) = common::signup(&state, Role::Host).await?;
    let (_, visitor) = common::signup(&state, Role::Visitor).await?;
    let admin = common::create_admin(&state).await?;
    open_slot(&state, &host, 1, 14).await?;

    let booked = booking_service::book_appointment(
        &state,
        &visitor,
        BookAppointmentRequest {
            host_id: host.user_id,
            date: common::next_monday(),
            start_hour: 14,
        },
    )
    .await?
    .data
    .expect("appointment");

    assert!(matches!(
        appointment_service::update_status(
            &state,
            &visitor,
            booked.id,
            AppointmentStatus::Confirmed
        )
        .await,
        Err(AppError::Forbidden)
    ));

    let confirmed = appointment_service::update_status(
        &state,
        &admin,
        booked.id,
        AppointmentStatus::Confirmed,
    )
    .await?;
    assert_eq!(confirmed.message, "Appointment updated");

    let unchanged = appointment_service::update_status(
        &state,
        &admin,
        booked.id,
        AppointmentStatus::Confirmed,
    )
    .await?;
    assert_eq!(unchanged.message, "Status unchanged");

    assert!(matches!(
        appointment_service::update_status(&state, &admin, booked.id, AppointmentStatus::Pending)
            .await,
        Err(AppError::InvalidTransition(_))
    ));

    // No visit has started yet.
    assert!(matches!(
        appointment_service::get_visit_log(&state, &visitor, booked.id).await,
        Err(AppError::NotFound)
    ));

    let cancelled = appointment_service::update_status(
        &state,
        &admin,
        booked.id,
        AppointmentStatus::Cancelled,
    )
    .await?
    .data
    .expect("cancelled");
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    Ok(())
}

#[tokio::test]
async fn open_slots_exclude_booked_hours() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (_, host) = common::signup(&state, Role::Host).await?;
    let (_, visitor) = common::signup(&state, Role::Visitor).await?;
    open_slot(&state, &host, 1, 9).await?;
    open_slot(&state, &host, 1, 10).await?;
    let monday = common::next_monday();
    let query = || OpenSlotsQuery {
        from: Some(monday),
        days: Some(1),
    };

    let open = booking_service::list_open_slots(&state, host.user_id, query())
        .await?
        .data
        .expect("open slots");
    let hours: Vec<i32> = open.items.iter().map(|s| s.start_hour).collect();
    assert_eq!(hours, vec![9, 10]);

    booking_service::book_appointment(
        &state,
        &visitor,
        BookAppointmentRequest {
            host_id: host.user_id,
            date: monday,
            start_hour: 9,
        },
    )
    .await?;

    let open = booking_service::list_open_slots(&state, host.user_id, query())
        .await?
        .data
        .expect("open slots");
    let hours: Vec<i32> = open.items.iter().map(|s| s.start_hour).collect();
    assert_eq!(hours, vec![10]);

    assert!(matches!(
        booking_service::list_open_slots(
            &state,
            host.user_id,
            OpenSlotsQuery {
                from: Some(monday),
                days: Some(29),
            },
        )
        .await,
        Err(AppError::InvalidRange(_))
    ));
    assert!(matches!(
        booking_service::list_open_slots(
            &state,
            host.user_id,
            OpenSlotsQuery {
                from: Some(Utc::now().date_naive() - Duration::days(1)),
                days: None,
            },
        )
        .await,
        Err(AppError::InvalidRange(_))
    ));

    Ok(())
}

#[tokio::test]
async fn accounts_roles_and_admin_listing() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (visitor_user, visitor) = common::signup(&state, Role::Visitor).await?;
    let (_, host) = common::signup(&state, Role::Host).await?;
    let admin = common::create_admin(&state).await?;

    // Visitors have no template until promoted.
    let template = availability_service::list_availability(&state, visitor.user_id)
        .await?
        .data
        .expect("availability");
    assert!(template.items.is_empty());

    let duplicate = auth_service::signup_user(
        &state,
        SignupRequest {
            phone_number: visitor_user.phone_number.clone(),
            first_name: "Other".into(),
            last_name: "Person".into(),
            role: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let unknown = auth_service::login_user(
        &state,
        LoginRequest {
            phone_number: common::unique_phone(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::Unauthorized(_))));

    assert!(matches!(
        admin_service::update_user_role(&state, &host, visitor.user_id, Role::Host).await,
        Err(AppError::Forbidden)
    ));
    let promoted = admin_service::update_user_role(&state, &admin, visitor.user_id, Role::Host)
        .await?
        .data
        .expect("promoted");
    assert_eq!(promoted.role, Role::Host);
    let template = availability_service::list_availability(&state, visitor.user_id)
        .await?
        .data
        .expect("availability");
    assert_eq!(template.items.len(), 5 * 9);

    assert!(matches!(
        stats_service::user_stats(&state, &host, visitor.user_id).await,
        Err(AppError::Forbidden)
    ));
    let stats = stats_service::user_stats(&state, &admin, host.user_id)
        .await?
        .data
        .expect("stats");
    assert_eq!(stats, UserStats::default());

    // Slots of another host can only be edited by an admin.
    assert!(matches!(
        availability_service::set_slot_status(
            &state,
            &host,
            visitor.user_id,
            SetSlotStatusRequest {
                day_of_week: 2,
                start_hour: 9,
                status: SlotStatus::Available,
            },
        )
        .await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        availability_service::set_slot_status(
            &state,
            &host,
            host.user_id,
            SetSlotStatusRequest {
                day_of_week: 6,
                start_hour: 9,
                status: SlotStatus::Available,
            },
        )
        .await,
        Err(AppError::InvalidRange(_))
    ));

    open_slot(&state, &host, 1, 15).await?;
    let monday = common::next_monday();
    booking_service::book_appointment(
        &state,
        &admin,
        BookAppointmentRequest {
            host_id: host.user_id,
            date: monday,
            start_hour: 15,
        },
    )
    .await?;

    assert!(matches!(
        admin_service::list_appointments(&state, &host, AppointmentListQuery::default()).await,
        Err(AppError::Forbidden)
    ));
    let listed = admin_service::list_appointments(
        &state,
        &admin,
        AppointmentListQuery {
            date: Some(monday),
            status: Some(AppointmentStatus::Pending),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?;
    let meta = listed.meta.expect("meta");
    assert!(meta.total.unwrap_or_default() >= 1);
    let items = listed.data.expect("appointments").items;
    assert!(
        items
            .iter()
            .all(|a| a.appointment_date == monday && a.status == AppointmentStatus::Pending)
    );

    Ok(())
}
