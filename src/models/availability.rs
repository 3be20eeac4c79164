use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::event::{normalize_time_block, Event};
use crate::utils::error::AppError;

/// One participant's answer for one (date, time block) slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Availability {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub event_id: Uuid,
    pub date: NaiveDate,
    pub time_block: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub date: NaiveDate,
    pub time_block: String,
    pub available: bool,
}

impl SlotUpdate {
    /// Bring the time block into the zero-padded form events store.
    pub fn normalized(self) -> Result<Self, AppError> {
        Ok(Self {
            time_block: normalize_time_block(&self.time_block)?,
            ..self
        })
    }

    pub fn ensure_within(&self, event: &Event) -> Result<(), AppError> {
        if !event.contains_slot(self.date, &self.time_block) {
            return Err(AppError::ValidationError(format!(
                "Slot {} {} is not part of this event",
                self.date, self.time_block
            )));
        }
        Ok(())
    }
}

/// Body of `POST /api/availability`: either a single slot toggle or a full
/// replacement of the participant's answers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AvailabilityRequest {
    Bulk {
        participant_id: Uuid,
        event_id: Uuid,
        availability: Vec<SlotUpdate>,
    },
    Single {
        participant_id: Uuid,
        event_id: Uuid,
        #[serde(flatten)]
        slot: SlotUpdate,
    },
}

impl AvailabilityRequest {
    pub fn participant_id(&self) -> Uuid {
        match self {
            AvailabilityRequest::Bulk { participant_id, .. }
            | AvailabilityRequest::Single { participant_id, .. } => *participant_id,
        }
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            AvailabilityRequest::Bulk { event_id, .. }
            | AvailabilityRequest::Single { event_id, .. } => *event_id,
        }
    }
}

/// Collapse repeated slots in a bulk update, keeping the last answer for each.
pub fn dedup_slots(slots: Vec<SlotUpdate>) -> Vec<SlotUpdate> {
    let mut result: Vec<SlotUpdate> = Vec::with_capacity(slots.len());
    for slot in slots {
        match result
            .iter_mut()
            .find(|s| s.date == slot.date && s.time_block == slot.time_block)
        {
            Some(existing) => existing.available = slot.available,
            None => result.push(slot),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_request_parses() {
        let participant_id = Uuid::new_v4();
        let req: AvailabilityRequest = serde_json::from_value(json!({
            "participant_id": participant_id,
            "event_id": Uuid::new_v4(),
            "date": "2024-01-01",
            "time_block": "10:00",
            "available": true
        }))
        .unwrap();

        match req {
            AvailabilityRequest::Single { slot, .. } => {
                assert_eq!(slot.time_block, "10:00");
                assert!(slot.available);
            }
            AvailabilityRequest::Bulk { .. } => panic!("expected single slot request"),
        }
    }

    #[test]
    fn test_bulk_request_parses() {
        let req: AvailabilityRequest = serde_json::from_value(json!({
            "participant_id": Uuid::new_v4(),
            "event_id": Uuid::new_v4(),
            "availability": [
                {"date": "2024-01-01", "time_block": "10:00", "available": true},
                {"date": "2024-01-01", "time_block": "14:00", "available": false}
            ]
        }))
        .unwrap();

        assert!(matches!(req, AvailabilityRequest::Bulk { ref availability, .. } if availability.len() == 2));
    }

    #[test]
    fn test_incomplete_request_fails_to_parse() {
        let result: Result<AvailabilityRequest, _> = serde_json::from_value(json!({
            "participant_id": Uuid::new_v4(),
            "event_id": Uuid::new_v4(),
            "date": "2024-01-01"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_normalized_pads_time_block() {
        let slot = SlotUpdate {
            date: "2024-01-01".parse().unwrap(),
            time_block: "9:00".to_string(),
            available: true,
        }
        .normalized()
        .unwrap();
        assert_eq!(slot.time_block, "09:00");

        let bad = SlotUpdate {
            date: "2024-01-01".parse().unwrap(),
            time_block: "9am".to_string(),
            available: true,
        };
        assert!(matches!(bad.normalized(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_dedup_keeps_last_answer() {
        let date: NaiveDate = "2024-01-01".parse().unwrap();
        let slot = |block: &str, available| SlotUpdate {
            date,
            time_block: block.to_string(),
            available,
        };
        let slots = dedup_slots(vec![
            slot("10:00", true),
            slot("14:00", true),
            slot("10:00", false),
        ]);
        assert_eq!(slots, vec![slot("10:00", false), slot("14:00", true)]);
    }
}
