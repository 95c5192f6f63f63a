//! Pure date and hour conversions shared by availability and booking.
//!
//! Days are numbered 1 (Monday) through 5 (Friday). Hours are whole UTC hours;
//! a slot starting at `h` always ends at `h + 1`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub const FIRST_WEEKDAY: i32 = 1;
pub const LAST_WEEKDAY: i32 = 5;

const WEEKDAY_NAMES: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Bookable hours of the day. `end_hour` is exclusive, so the last slot
/// starts at `end_hour - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatingWindow {
    pub start_hour: i32,
    pub end_hour: i32,
}

impl Default for OperatingWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
        }
    }
}

impl OperatingWindow {
    pub fn new(start_hour: i32, end_hour: i32) -> Option<Self> {
        if (0..24).contains(&start_hour) && start_hour < end_hour && end_hour <= 24 {
            Some(Self {
                start_hour,
                end_hour,
            })
        } else {
            None
        }
    }

    /// Start hours of every slot in the window.
    pub fn hours(&self) -> std::ops::Range<i32> {
        self.start_hour..self.end_hour
    }

    pub fn validate_hour(&self, hour: i32) -> AppResult<()> {
        if hour < self.start_hour || hour >= self.end_hour {
            return Err(AppError::InvalidRange(format!(
                "hour {hour} is outside {}..{}",
                hour_label(self.start_hour),
                hour_label(self.end_hour)
            )));
        }
        Ok(())
    }

    pub fn validate_slot(&self, day_of_week: i32, hour: i32) -> AppResult<()> {
        validate_day(day_of_week)?;
        self.validate_hour(hour)
    }
}

pub fn weekdays() -> std::ops::RangeInclusive<i32> {
    FIRST_WEEKDAY..=LAST_WEEKDAY
}

pub fn validate_day(day_of_week: i32) -> AppResult<()> {
    if !(FIRST_WEEKDAY..=LAST_WEEKDAY).contains(&day_of_week) {
        return Err(AppError::InvalidRange(format!(
            "day_of_week {day_of_week} must be between {FIRST_WEEKDAY} and {LAST_WEEKDAY}"
        )));
    }
    Ok(())
}

pub fn weekday_name(day_of_week: i32) -> AppResult<&'static str> {
    validate_day(day_of_week)?;
    Ok(WEEKDAY_NAMES[(day_of_week - FIRST_WEEKDAY) as usize])
}

pub fn weekday_from_name(name: &str) -> AppResult<i32> {
    WEEKDAY_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
        .map(|idx| idx as i32 + FIRST_WEEKDAY)
        .ok_or_else(|| AppError::InvalidRange(format!("unknown weekday {name:?}")))
}

/// `9` -> `"09:00"`.
pub fn hour_label(hour: i32) -> String {
    format!("{hour:02}:00")
}

/// `"09:00"` -> `9`. Only whole hours are accepted.
pub fn parse_hour_label(label: &str) -> AppResult<i32> {
    let time = NaiveTime::parse_from_str(label.trim(), "%H:%M")
        .map_err(|_| AppError::InvalidRange(format!("{label:?} is not an HH:00 time")))?;
    if time.minute() != 0 {
        return Err(AppError::InvalidRange(format!(
            "{label:?} does not start on the hour"
        )));
    }
    Ok(time.hour() as i32)
}

/// ISO weekday of a date, 1 = Monday .. 7 = Sunday.
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().number_from_monday() as i32
}

/// Weekday of a date restricted to the bookable Monday..Friday range.
pub fn bookable_day_of_week(date: NaiveDate) -> AppResult<i32> {
    let day = day_of_week(date);
    if day > LAST_WEEKDAY {
        return Err(AppError::InvalidRange(format!(
            "{date} falls on a weekend"
        )));
    }
    Ok(day)
}

/// Absolute UTC instant at which `hour` starts on `date`.
pub fn slot_start(date: NaiveDate, hour: i32) -> AppResult<DateTime<Utc>> {
    let hour = u32::try_from(hour)
        .map_err(|_| AppError::InvalidRange(format!("hour {hour} is negative")))?;
    date.and_hms_opt(hour, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::InvalidRange(format!("hour {hour} is not a valid hour")))
}

/// Start and end instants of the one-hour slot at `hour` on `date`.
pub fn slot_bounds(date: NaiveDate, hour: i32) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = slot_start(date, hour)?;
    let end = start
        .checked_add_signed(Duration::hours(1))
        .ok_or_else(|| AppError::InvalidRange(format!("{date} is out of range")))?;
    Ok((start, end))
}

/// `from` moved forward by `days`, or `InvalidRange` past the last representable date.
pub fn add_days(from: NaiveDate, days: i64) -> AppResult<NaiveDate> {
    from.checked_add_signed(Duration::days(days))
        .ok_or_else(|| AppError::InvalidRange(format!("{from} + {days} days is out of range")))
}

/// Inverse of [`slot_start`]: splits an instant that sits exactly on an hour.
pub fn split_slot_start(instant: DateTime<Utc>) -> AppResult<(NaiveDate, i32)> {
    if instant.minute() != 0 || instant.second() != 0 || instant.nanosecond() != 0 {
        return Err(AppError::InvalidRange(format!(
            "{instant} does not start on the hour"
        )));
    }
    Ok((instant.date_naive(), instant.hour() as i32))
}

/// First date on or after `from` that falls on `day_of_week`.
pub fn next_occurrence(from: NaiveDate, day_of_week: i32) -> AppResult<NaiveDate> {
    validate_day(day_of_week)?;
    let offset = (day_of_week - self::day_of_week(from)).rem_euclid(7);
    add_days(from, offset as i64)
}
