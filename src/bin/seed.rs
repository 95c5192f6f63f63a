use visitor_booking_api::{
    calendar::{self, OperatingWindow},
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    // Ensure migrations are applied.
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "+10000000001", "Ada", "Admin", "admin").await?;
    let host_id = ensure_user(&pool, "+10000000002", "Hana", "Host", "host").await?;
    let visitor_id = ensure_user(&pool, "+10000000003", "Vic", "Visitor", "visitor").await?;
    seed_availability(&pool, host_id, config.window).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Host ID: {host_id}, Visitor ID: {visitor_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    phone_number: &str,
    first_name: &str,
    last_name: &str,
    role: &str,
) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (first_name, last_name, phone_number, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (phone_number) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(phone_number)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {phone_number} (role={role})");
    Ok(id)
}

/// Full weekday grid for the host; mornings open, afternoons closed.
async fn seed_availability(
    pool: &sqlx::PgPool,
    host_id: i64,
    window: OperatingWindow,
) -> anyhow::Result<()> {
    for day in calendar::weekdays() {
        for hour in window.hours() {
            let status = if hour < 12 { "available" } else { "not_available" };
            sqlx::query(
                r#"
                INSERT INTO availability_slots (host_id, day_of_week, start_hour, end_hour, status)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (host_id, day_of_week, start_hour) DO UPDATE SET status = EXCLUDED.status
                "#,
            )
            .bind(host_id)
            .bind(day)
            .bind(hour)
            .bind(hour + 1)
            .bind(status)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded availability for host {host_id}");
    Ok(())
}
