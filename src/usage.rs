//! Free-tier usage ceilings.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::utils::error::AppError;

pub const FREE_EVENTS_PER_WEEK: i64 = 10;
pub const FREE_PARTICIPANTS_PER_EVENT: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyUsage {
    pub count: i64,
    pub limit: i64,
    pub remaining: i64,
    pub week_start: DateTime<Utc>,
}

impl WeeklyUsage {
    pub fn new(count: i64, week_start: DateTime<Utc>) -> Self {
        Self {
            count,
            limit: FREE_EVENTS_PER_WEEK,
            remaining: (FREE_EVENTS_PER_WEEK - count).max(0),
            week_start,
        }
    }
}

/// Monday 00:00 of the week containing `now`.
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    (now.date() - Duration::days(days_since_monday)).and_time(NaiveTime::MIN)
}

/// Start of the current week in server local time, as a UTC instant.
pub fn current_week_start() -> DateTime<Utc> {
    let start = week_start(Local::now().naive_local());
    match Local.from_local_datetime(&start).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&start),
    }
}

pub fn ensure_event_quota(events_this_week: i64) -> Result<(), AppError> {
    if events_this_week >= FREE_EVENTS_PER_WEEK {
        return Err(AppError::LimitReached(format!(
            "Weekly event limit reached ({} per week on the free plan)",
            FREE_EVENTS_PER_WEEK
        )));
    }
    Ok(())
}

pub fn ensure_participant_capacity(participants: i64) -> Result<(), AppError> {
    if participants >= FREE_PARTICIPANTS_PER_EVENT {
        return Err(AppError::LimitReached(format!(
            "This event has reached the maximum of {} participants",
            FREE_PARTICIPANTS_PER_EVENT
        )));
    }
    Ok(())
}
