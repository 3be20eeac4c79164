use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::handlers::participants::EventQuery;
use crate::models::availability::dedup_slots;
use crate::models::{Availability, AvailabilityRequest, Event, Participant, SlotUpdate};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{JsonBody, QueryParams};
use crate::utils::response::success;

#[derive(Serialize)]
struct AvailabilityBody<T: Serialize> {
    availability: T,
}

/// GET /api/availability?event_id=
pub async fn list_availability(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EventQuery>,
) -> Result<Response, AppError> {
    let event_id = query.required_event_id()?;
    let availability = state.store.list_availability(event_id).await?;
    Ok(success(AvailabilityBody { availability }))
}

/// Resolve and check the participant and event a write refers to.
async fn writable_target(
    state: &AppState,
    req: &AvailabilityRequest,
) -> Result<(Participant, Event), AppError> {
    let participant = state
        .store
        .get_participant(req.participant_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
    if participant.event_id != req.event_id() {
        return Err(AppError::ValidationError(
            "Participant does not belong to this event".to_string(),
        ));
    }

    let event = state
        .store
        .get_event(participant.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    event.ensure_open()?;

    Ok((participant, event))
}

/// POST /api/availability
///
/// A single slot is upserted on its (participant, event, date, time block) key. A bulk body
/// replaces everything the participant answered for the event.
pub async fn save_availability(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AvailabilityRequest>,
) -> Result<Response, AppError> {
    let (participant, event) = writable_target(&state, &req).await?;

    match req {
        AvailabilityRequest::Single { slot, .. } => {
            let slot = slot.normalized()?;
            slot.ensure_within(&event)?;
            let row: Availability = state
                .store
                .upsert_availability(participant.id, event.id, slot)
                .await?;
            tracing::debug!(
                participant_id = %participant.id,
                date = %row.date,
                time_block = %row.time_block,
                available = row.available,
                "Availability updated"
            );
            Ok(success(AvailabilityBody { availability: row }))
        }
        AvailabilityRequest::Bulk { availability, .. } => {
            let slots = availability
                .into_iter()
                .map(SlotUpdate::normalized)
                .collect::<Result<Vec<_>, _>>()?;
            let slots = dedup_slots(slots);
            for slot in &slots {
                slot.ensure_within(&event)?;
            }
            let rows = state
                .store
                .replace_availability(participant.id, event.id, slots)
                .await?;
            tracing::debug!(
                participant_id = %participant.id,
                slots = rows.len(),
                "Availability replaced"
            );
            Ok(success(AvailabilityBody { availability: rows }))
        }
    }
}
