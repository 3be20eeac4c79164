use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CreateParticipantRequest, Participant};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{JsonBody, QueryParams};
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub event_id: Option<Uuid>,
}

impl EventQuery {
    pub fn required_event_id(&self) -> Result<Uuid, AppError> {
        self.event_id
            .ok_or_else(|| AppError::ValidationError("event_id is required".to_string()))
    }
}

#[derive(Serialize)]
struct ParticipantsBody {
    participants: Vec<Participant>,
}

#[derive(Serialize)]
struct ParticipantBody {
    participant: Participant,
}

/// GET /api/participants?event_id=
pub async fn list_participants(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EventQuery>,
) -> Result<Response, AppError> {
    let event_id = query.required_event_id()?;
    let participants = state.store.list_participants(event_id).await?;
    Ok(success(ParticipantsBody { participants }))
}

/// POST /api/participants
///
/// Anyone holding the event link may join. The store checks the event is open and below the
/// participant ceiling in the same step as the insert.
pub async fn create_participant(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateParticipantRequest>,
) -> Result<Response, AppError> {
    let new_participant = req.validate()?;

    let participant = state.store.create_participant(new_participant).await?;
    tracing::info!(
        event_id = %participant.event_id,
        participant_id = %participant.id,
        "Participant joined"
    );

    Ok(created(ParticipantBody { participant }))
}
