use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AnytimeStore, StoreResult};
use crate::models::{
    Availability, Event, EventStatus, EventUpdate, NewEvent, NewParticipant, Participant,
    SlotUpdate,
};
use crate::usage::{ensure_event_quota, ensure_participant_capacity};
use crate::utils::error::AppError;

/// An [AnytimeStore] keeping all rows in process memory.
///
/// Every method takes the single lock for its whole duration, so the availability upsert and the
/// ceiling checks are as atomic as their PostgreSQL counterparts.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
}

#[derive(Default)]
struct MemoryData {
    events: Vec<Event>,
    participants: Vec<Participant>,
    availability: Vec<Availability>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryData>> {
        self.data
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

impl MemoryData {
    fn events_created_since(&self, user_id: Uuid, since: DateTime<Utc>) -> i64 {
        self.events
            .iter()
            .filter(|e| e.created_by == user_id && e.created_at >= since)
            .count() as i64
    }

    fn upsert(&mut self, participant_id: Uuid, event_id: Uuid, slot: SlotUpdate) -> Availability {
        let now = Utc::now();
        if let Some(existing) = self.availability.iter_mut().find(|a| {
            a.participant_id == participant_id
                && a.event_id == event_id
                && a.date == slot.date
                && a.time_block == slot.time_block
        }) {
            existing.available = slot.available;
            existing.updated_at = now;
            return existing.clone();
        }

        let row = Availability {
            id: Uuid::new_v4(),
            participant_id,
            event_id,
            date: slot.date,
            time_block: slot.time_block,
            available: slot.available,
            created_at: now,
            updated_at: now,
        };
        self.availability.push(row.clone());
        row
    }
}

#[async_trait]
impl AnytimeStore for MemoryStore {
    async fn list_events_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<Event>> {
        let data = self.lock()?;
        let mut events: Vec<Event> = data
            .events
            .iter()
            .filter(|e| e.created_by == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn create_event(
        &self,
        event: NewEvent,
        created_by: Uuid,
        week_start: DateTime<Utc>,
    ) -> StoreResult<Event> {
        let mut data = self.lock()?;
        ensure_event_quota(data.events_created_since(created_by, week_start))?;

        let row = Event {
            id: Uuid::new_v4(),
            name: event.name,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            time_blocks: event.time_blocks,
            is_24_7: event.is_24_7,
            status: EventStatus::Open,
            created_by,
            created_at: Utc::now(),
        };
        data.events.push(row.clone());
        Ok(row)
    }

    async fn get_event(&self, event_id: Uuid) -> StoreResult<Option<Event>> {
        let data = self.lock()?;
        Ok(data.events.iter().find(|e| e.id == event_id).cloned())
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        update: EventUpdate,
    ) -> StoreResult<Option<Event>> {
        let mut data = self.lock()?;
        let Some(event) = data.events.iter_mut().find(|e| e.id == event_id) else {
            return Ok(None);
        };
        update.check_against(event.status)?;
        if let Some(name) = update.name {
            event.name = name;
        }
        if let Some(description) = update.description {
            event.description = description;
        }
        if let Some(status) = update.status {
            event.status = status;
        }
        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool> {
        let mut data = self.lock()?;
        let before = data.events.len();
        data.events.retain(|e| e.id != event_id);
        if data.events.len() == before {
            return Ok(false);
        }
        data.participants.retain(|p| p.event_id != event_id);
        data.availability.retain(|a| a.event_id != event_id);
        Ok(true)
    }

    async fn count_events_created_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        Ok(self.lock()?.events_created_since(user_id, since))
    }

    async fn list_participants(&self, event_id: Uuid) -> StoreResult<Vec<Participant>> {
        let data = self.lock()?;
        Ok(data
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn get_participant(&self, participant_id: Uuid) -> StoreResult<Option<Participant>> {
        let data = self.lock()?;
        Ok(data
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned())
    }

    async fn create_participant(&self, participant: NewParticipant) -> StoreResult<Participant> {
        let mut data = self.lock()?;
        let event = data
            .events
            .iter()
            .find(|e| e.id == participant.event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        event.ensure_open()?;
        let joined = data
            .participants
            .iter()
            .filter(|p| p.event_id == participant.event_id)
            .count();
        ensure_participant_capacity(joined as i64)?;

        let row = Participant {
            id: Uuid::new_v4(),
            event_id: participant.event_id,
            name: participant.name,
            email: participant.email,
            color: participant.color,
            created_at: Utc::now(),
        };
        data.participants.push(row.clone());
        Ok(row)
    }

    async fn list_availability(&self, event_id: Uuid) -> StoreResult<Vec<Availability>> {
        let data = self.lock()?;
        let mut rows: Vec<Availability> = data
            .availability
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.date, &a.time_block).cmp(&(b.date, &b.time_block)));
        Ok(rows)
    }

    async fn upsert_availability(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        slot: SlotUpdate,
    ) -> StoreResult<Availability> {
        Ok(self.lock()?.upsert(participant_id, event_id, slot))
    }

    async fn replace_availability(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        slots: Vec<SlotUpdate>,
    ) -> StoreResult<Vec<Availability>> {
        let mut data = self.lock()?;
        data.availability
            .retain(|a| !(a.participant_id == participant_id && a.event_id == event_id));
        Ok(slots
            .into_iter()
            .map(|slot| data.upsert(participant_id, event_id, slot))
            .collect())
    }
}
