use std::env;

use anyhow::{Context, bail};

use crate::calendar::OperatingWindow;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub window: OperatingWindow,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let window = window_from_vars(
            env::var("OPERATING_HOUR_START").ok().as_deref(),
            env::var("OPERATING_HOUR_END").ok().as_deref(),
        )?;

        Ok(Self {
            port,
            database_url,
            host,
            max_connections,
            window,
        })
    }
}

fn window_from_vars(start: Option<&str>, end: Option<&str>) -> anyhow::Result<OperatingWindow> {
    let default = OperatingWindow::default();
    let start = match start {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .with_context(|| format!("OPERATING_HOUR_START is not a number: {raw}"))?,
        None => default.start_hour,
    };
    let end = match end {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .with_context(|| format!("OPERATING_HOUR_END is not a number: {raw}"))?,
        None => default.end_hour,
    };

    match OperatingWindow::new(start, end) {
        Some(window) => Ok(window),
        None => bail!("operating window {start}..{end} must satisfy 0 <= start < end <= 24"),
    }
}
