use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AnytimeStore, StoreResult};
use crate::models::{
    Availability, Event, EventUpdate, NewEvent, NewParticipant, Participant, SlotUpdate,
};
use crate::usage::{ensure_event_quota, ensure_participant_capacity};
use crate::utils::error::AppError;

const EVENT_COLUMNS: &str = "id, name, description, start_date, end_date, time_blocks, is_24_7, status, created_by, created_at";
const PARTICIPANT_COLUMNS: &str = "id, event_id, name, email, color, created_at";

const SQL_UPSERT_AVAILABILITY: &str = r#"
INSERT INTO availability (participant_id, event_id, date, time_block, available)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (participant_id, event_id, date, time_block)
DO UPDATE SET available = EXCLUDED.available, updated_at = NOW()
RETURNING id, participant_id, event_id, date, time_block, available, created_at, updated_at
"#;

// A locked event only accepts a repeated lock; the status check runs inside the UPDATE so a
// lock committed after the handler read the event still wins.
const SQL_UPDATE_EVENT: &str = r#"
UPDATE events
SET
    name = COALESCE($2, name),
    description = CASE WHEN $4 THEN $3 ELSE description END,
    status = COALESCE($5, status)
WHERE id = $1
  AND (
    status = 'open'
    OR ($2::text IS NULL AND NOT $4 AND COALESCE($5::text, 'locked') = 'locked')
  )
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AnytimeStore for PgStore {
    async fn list_events_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_event(
        &self,
        event: NewEvent,
        created_by: Uuid,
        week_start: DateTime<Utc>,
    ) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await?;

        // serializes event creation per user until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(created_by)
            .execute(&mut *tx)
            .await?;

        let this_week = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events WHERE created_by = $1 AND created_at >= $2",
        )
        .bind(created_by)
        .bind(week_start)
        .fetch_one(&mut *tx)
        .await?;
        ensure_event_quota(this_week)?;

        let row = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, description, start_date, end_date, time_blocks, is_24_7, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'open', $7)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.time_blocks)
        .bind(event.is_24_7)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(event_id = %row.id, "Inserted event");
        Ok(row)
    }

    async fn get_event(&self, event_id: Uuid) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        update: EventUpdate,
    ) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "{SQL_UPDATE_EVENT} RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .bind(&update.name)
        .bind(update.description.clone().flatten())
        .bind(update.description.is_some())
        .bind(update.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            return Ok(row);
        }

        // nothing updated: either the event is gone or its status refused the change
        match self.get_event(event_id).await? {
            None => Ok(None),
            Some(current) => {
                update.check_against(current.status)?;
                Err(AppError::Conflict(
                    "This event is locked and no longer accepts changes".to_string(),
                ))
            }
        }
    }

    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool> {
        // participants and availability go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_events_created_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM events WHERE created_by = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_participants(&self, event_id: Uuid) -> StoreResult<Vec<Participant>> {
        let rows = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 ORDER BY created_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_participant(&self, participant_id: Uuid) -> StoreResult<Option<Participant>> {
        let row = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create_participant(&self, participant: NewParticipant) -> StoreResult<Participant> {
        let mut tx = self.pool.begin().await?;

        // the row lock holds concurrent joins (and a concurrent lock) back until commit
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(participant.event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        event.ensure_open()?;

        let joined =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants WHERE event_id = $1")
                .bind(event.id)
                .fetch_one(&mut *tx)
                .await?;
        ensure_participant_capacity(joined)?;

        let row = sqlx::query_as::<_, Participant>(&format!(
            r#"
            INSERT INTO participants (event_id, name, email, color)
            VALUES ($1, $2, $3, $4)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(participant.event_id)
        .bind(&participant.name)
        .bind(&participant.email)
        .bind(&participant.color)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn list_availability(&self, event_id: Uuid) -> StoreResult<Vec<Availability>> {
        let rows = sqlx::query_as::<_, Availability>(
            r#"
            SELECT id, participant_id, event_id, date, time_block, available, created_at, updated_at
            FROM availability
            WHERE event_id = $1
            ORDER BY date ASC, time_block ASC, created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert_availability(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        slot: SlotUpdate,
    ) -> StoreResult<Availability> {
        let row = sqlx::query_as::<_, Availability>(SQL_UPSERT_AVAILABILITY)
            .bind(participant_id)
            .bind(event_id)
            .bind(slot.date)
            .bind(&slot.time_block)
            .bind(slot.available)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn replace_availability(
        &self,
        participant_id: Uuid,
        event_id: Uuid,
        slots: Vec<SlotUpdate>,
    ) -> StoreResult<Vec<Availability>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM availability WHERE participant_id = $1 AND event_id = $2")
            .bind(participant_id)
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        let mut rows = Vec::with_capacity(slots.len());
        for slot in slots {
            let row = sqlx::query_as::<_, Availability>(SQL_UPSERT_AVAILABILITY)
                .bind(participant_id)
                .bind(event_id)
                .bind(slot.date)
                .bind(&slot.time_block)
                .bind(slot.available)
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;
        Ok(rows)
    }
}
