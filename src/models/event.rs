use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const MAX_EVENT_NAME_LEN: usize = 200;
/// Longest allowed date range, counted in days including both ends.
pub const MAX_EVENT_DAYS: i64 = 366;

const TIME_BLOCK_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Locked,
}

#[derive(Debug, Error)]
#[error("unknown event status '{0}'")]
pub struct ParseEventStatusError(String);

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Open => "open",
            EventStatus::Locked => "locked",
        }
    }

    /// Status after a requested change. Locking is one-way.
    pub fn transition_to(self, next: EventStatus) -> Result<EventStatus, AppError> {
        match (self, next) {
            (EventStatus::Locked, EventStatus::Open) => Err(AppError::Conflict(
                "A locked event cannot be reopened".to_string(),
            )),
            (_, next) => Ok(next),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ParseEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(EventStatus::Open),
            "locked" => Ok(EventStatus::Locked),
            other => Err(ParseEventStatusError(other.to_string())),
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = ParseEventStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time_blocks: Vec<String>,
    pub is_24_7: bool,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Every calendar date of the event, `start_date` through `end_date` inclusive.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date
            .iter_days()
            .take_while(move |date| *date <= end)
    }

    pub fn is_locked(&self) -> bool {
        self.status == EventStatus::Locked
    }

    pub fn contains_slot(&self, date: NaiveDate, time_block: &str) -> bool {
        date >= self.start_date
            && date <= self.end_date
            && self.time_blocks.iter().any(|block| block == time_block)
    }

    pub fn ensure_open(&self) -> Result<(), AppError> {
        if self.is_locked() {
            return Err(AppError::Conflict(
                "This event is locked and no longer accepts changes".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub time_blocks: Vec<String>,
    #[serde(default)]
    pub is_24_7: bool,
}

/// A validated event, ready to be stored.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time_blocks: Vec<String>,
    pub is_24_7: bool,
}

impl CreateEventRequest {
    pub fn validate(self) -> Result<NewEvent, AppError> {
        let name = validate_event_name(self.name.as_deref())?;
        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(AppError::ValidationError(
                "Missing required fields: name, start_date, end_date".to_string(),
            ));
        };
        if end_date < start_date {
            return Err(AppError::ValidationError(
                "end_date must not be before start_date".to_string(),
            ));
        }
        if (end_date - start_date).num_days() + 1 > MAX_EVENT_DAYS {
            return Err(AppError::ValidationError(format!(
                "An event may span at most {} days",
                MAX_EVENT_DAYS
            )));
        }

        let time_blocks = if self.time_blocks.is_empty() {
            if !self.is_24_7 {
                return Err(AppError::ValidationError(
                    "Either time_blocks or is_24_7 is required".to_string(),
                ));
            }
            hourly_time_blocks()
        } else {
            normalize_time_blocks(&self.time_blocks)?
        };

        Ok(NewEvent {
            name,
            description: normalize_description(self.description),
            start_date,
            end_date,
            time_blocks,
            is_24_7: self.is_24_7,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<EventStatus>,
}

/// Fields to overwrite on an existing event; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    fn edits_details(&self) -> bool {
        self.name.is_some() || self.description.is_some()
    }

    /// Whether this update may be applied to an event currently in `current`.
    ///
    /// Stores call this at write time, so a lock that lands between reading the event and
    /// writing the update still wins.
    pub fn check_against(&self, current: EventStatus) -> Result<(), AppError> {
        if let Some(next) = self.status {
            current.transition_to(next)?;
        }
        if current == EventStatus::Locked && self.edits_details() {
            return Err(AppError::Conflict(
                "This event is locked and no longer accepts changes".to_string(),
            ));
        }
        Ok(())
    }
}

impl UpdateEventRequest {
    /// Check the request against the current state of `event`.
    pub fn validate(self, event: &Event) -> Result<EventUpdate, AppError> {
        let name = match self.name {
            Some(name) => Some(validate_event_name(Some(&name))?),
            None => None,
        };
        let update = EventUpdate {
            name,
            description: self.description.map(|d| normalize_description(Some(d))),
            status: self.status,
        };
        update.check_against(event.status)?;

        Ok(update)
    }
}

fn validate_event_name(name: Option<&str>) -> Result<String, AppError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(AppError::ValidationError(
            "Missing required fields: name, start_date, end_date".to_string(),
        ));
    }
    if name.chars().count() > MAX_EVENT_NAME_LEN {
        return Err(AppError::ValidationError(format!(
            "Event name must be at most {} characters",
            MAX_EVENT_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Parse one `HH:MM` block into its canonical zero-padded form.
pub fn normalize_time_block(block: &str) -> Result<String, AppError> {
    parse_time_block(block).map(|t| t.format(TIME_BLOCK_FORMAT).to_string())
}

fn parse_time_block(block: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(block.trim(), TIME_BLOCK_FORMAT).map_err(|_| {
        AppError::ValidationError(format!("Invalid time block '{}', expected HH:MM", block))
    })
}

/// Parse `HH:MM` blocks, drop duplicates and sort them by time of day.
pub fn normalize_time_blocks(blocks: &[String]) -> Result<Vec<String>, AppError> {
    let mut times = blocks
        .iter()
        .map(|block| parse_time_block(block))
        .collect::<Result<Vec<_>, _>>()?;
    times.sort();
    times.dedup();

    Ok(times
        .into_iter()
        .map(|t| t.format(TIME_BLOCK_FORMAT).to_string())
        .collect())
}

/// The 24 full-hour blocks used by round-the-clock events.
pub fn hourly_time_blocks() -> Vec<String> {
    (0..24).map(|hour| format!("{:02}:00", hour)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn request(blocks: &[&str], is_24_7: bool) -> CreateEventRequest {
        CreateEventRequest {
            name: Some("  Team offsite ".to_string()),
            description: Some("   ".to_string()),
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2024-01-03")),
            time_blocks: blocks.iter().map(|b| b.to_string()).collect(),
            is_24_7,
        }
    }

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "Standup".to_string(),
            description: None,
            start_date: date("2024-02-27"),
            end_date: date("2024-03-01"),
            time_blocks: vec!["09:00".to_string(), "13:30".to_string()],
            is_24_7: false,
            status: EventStatus::Open,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_time_blocks_are_sorted_and_deduplicated() {
        let new_event = request(&["14:00", "9:30", "09:30", "10:00"], false)
            .validate()
            .unwrap();
        assert_eq!(new_event.time_blocks, vec!["09:30", "10:00", "14:00"]);
        assert_eq!(new_event.name, "Team offsite");
        assert_eq!(new_event.description, None);
    }

    #[test]
    fn test_invalid_time_block_is_rejected() {
        let err = request(&["25:00"], false).validate().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_time_blocks_or_24_7_required() {
        let err = request(&[], false).validate().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let round_the_clock = request(&[], true).validate().unwrap();
        assert_eq!(round_the_clock.time_blocks.len(), 24);
        assert_eq!(round_the_clock.time_blocks[0], "00:00");
        assert_eq!(round_the_clock.time_blocks[23], "23:00");
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let mut req = request(&["10:00"], false);
        req.start_date = None;
        assert!(matches!(
            req.validate().unwrap_err(),
            AppError::ValidationError(_)
        ));

        let mut req = request(&["10:00"], false);
        req.name = Some("   ".to_string());
        assert!(matches!(
            req.validate().unwrap_err(),
            AppError::ValidationError(_)
        ));
    }

    #[test]
    fn test_reversed_and_oversized_ranges_are_rejected() {
        let mut req = request(&["10:00"], false);
        req.end_date = Some(date("2023-12-31"));
        assert!(req.validate().is_err());

        let mut req = request(&["10:00"], false);
        req.end_date = Some(date("2025-01-01"));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_dates_are_inclusive_and_cross_month_boundaries() {
        let dates: Vec<_> = sample_event().dates().collect();
        assert_eq!(
            dates,
            vec![
                date("2024-02-27"),
                date("2024-02-28"),
                date("2024-02-29"),
                date("2024-03-01")
            ]
        );
    }

    #[test]
    fn test_contains_slot() {
        let event = sample_event();
        assert!(event.contains_slot(date("2024-02-29"), "13:30"));
        assert!(!event.contains_slot(date("2024-03-02"), "13:30"));
        assert!(!event.contains_slot(date("2024-02-29"), "14:00"));
    }

    #[test]
    fn test_status_only_moves_forward() {
        assert_eq!(
            EventStatus::Open.transition_to(EventStatus::Locked).unwrap(),
            EventStatus::Locked
        );
        assert_eq!(
            EventStatus::Locked
                .transition_to(EventStatus::Locked)
                .unwrap(),
            EventStatus::Locked
        );
        assert!(matches!(
            EventStatus::Locked.transition_to(EventStatus::Open),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_renaming_a_locked_event_is_rejected() {
        let mut event = sample_event();
        event.status = EventStatus::Locked;
        let update = UpdateEventRequest {
            name: Some("Renamed".to_string()),
            description: None,
            status: None,
        };
        assert!(matches!(
            update.validate(&event),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_blank_description_clears_it() {
        let update = UpdateEventRequest {
            name: None,
            description: Some("   ".to_string()),
            status: None,
        }
        .validate(&sample_event())
        .unwrap();
        assert_eq!(update.description, Some(None));

        let update = UpdateEventRequest {
            name: None,
            description: Some(" Bring snacks ".to_string()),
            status: None,
        }
        .validate(&sample_event())
        .unwrap();
        assert_eq!(update.description, Some(Some("Bring snacks".to_string())));
    }

    #[test]
    fn test_update_checked_against_locked_status() {
        let reopen = EventUpdate {
            status: Some(EventStatus::Open),
            ..Default::default()
        };
        assert!(reopen.check_against(EventStatus::Open).is_ok());
        assert!(matches!(
            reopen.check_against(EventStatus::Locked),
            Err(AppError::Conflict(_))
        ));

        let lock_again = EventUpdate {
            status: Some(EventStatus::Locked),
            ..Default::default()
        };
        assert!(lock_again.check_against(EventStatus::Locked).is_ok());
    }

    #[test]
    fn test_single_time_block_is_zero_padded() {
        assert_eq!(normalize_time_block("9:00").unwrap(), "09:00");
        assert_eq!(normalize_time_block(" 14:30 ").unwrap(), "14:30");
        assert!(normalize_time_block("noon").is_err());
    }

    #[test]
    fn test_status_round_trips_through_text() {
        assert_eq!("locked".parse::<EventStatus>().unwrap(), EventStatus::Locked);
        assert_eq!(EventStatus::Open.to_string(), "open");
        assert!("closed".parse::<EventStatus>().is_err());
    }
}
