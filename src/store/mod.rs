//! Persistence for events, participants and availability.
//!
//! Handlers talk to an [AnytimeStore] trait object held in the application state. The primary
//! implementation ([PgStore]) wraps a PostgreSQL pool; [MemoryStore] keeps everything in process
//! and backs the tests (and `DATABASE_URL=memory` for local development).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Availability, Event, EventUpdate, NewEvent, NewParticipant, Participant, SlotUpdate,
};
use crate::utils::error::AppError;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait AnytimeStore: Send + Sync {
    /// Events created by `user_id`, newest first.
    async fn list_events_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<Event>>;
    /// Insert an event unless `created_by` already created the weekly quota since
    /// `week_start`. Counting and inserting happen as one step.
    async fn create_event(
        &self,
        event: NewEvent,
        created_by: Uuid,
        week_start: DateTime<Utc>,
    ) -> StoreResult<Event>;
    async fn get_event(&self, event_id: Uuid) -> StoreResult<Option<Event>>;
    /// Apply `update`, re-checked against the stored status at write time.
    ///
    /// Fails with `Conflict` if the event is locked and the update would reopen or edit it.
    async fn update_event(&self, event_id: Uuid, update: EventUpdate)
        -> StoreResult<Option<Event>>;
    /// Delete an event together with its participants and availability.
    ///
    /// Returns `false` if the event did not exist.
    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool>;
    async fn count_events_created_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64>;

    /// Participants of an event in join order.
    async fn list_participants(&self, event_id: Uuid) -> StoreResult<Vec<Participant>>;
    async fn get_participant(&self, participant_id: Uuid) -> StoreResult<Option<Participant>>;
    /// Join an open event that is below the participant ceiling. The ceiling check and the
    /// insert happen as one step.
    async fn create_participant(&self, participant: NewParticipant) -> StoreResult<Participant>;

    async fn list_availability(&self, event_id: Uuid) -> StoreResult<Vec<Availability>>;
    /// Insert or update the row keyed by (participant, event, date, time block) in one step.
    async fn upsert_availability(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        slot: SlotUpdate,
    ) -> StoreResult<Availability>;
    /// Replace all of a participant's rows for the event with `slots`.
    async fn replace_availability(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        slots: Vec<SlotUpdate>,
    ) -> StoreResult<Vec<Availability>>;
}
