use axum::{extract::State, response::Response};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregation::{aggregate, Aggregation};
use crate::auth::AuthUser;
use crate::models::{Availability, CreateEventRequest, Event, Participant, UpdateEventRequest};
use crate::state::AppState;
use crate::usage::current_week_start;
use crate::utils::error::AppError;
use crate::utils::extract::{JsonBody, PathParam};
use crate::utils::response::{created, empty_success, success};

#[derive(Serialize)]
struct EventsBody {
    events: Vec<Event>,
}

#[derive(Serialize)]
struct EventBody {
    event: Event,
}

#[derive(Serialize)]
struct EventDetailsBody {
    event: Event,
    participants: Vec<Participant>,
    availability: Vec<Availability>,
}

#[derive(Serialize)]
struct AnalyticsBody {
    analytics: Aggregation,
}

async fn load_event(state: &AppState, event_id: Uuid) -> Result<Event, AppError> {
    state
        .store
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))
}

async fn load_own_event(
    state: &AppState,
    user: &AuthUser,
    event_id: Uuid,
) -> Result<Event, AppError> {
    let event = load_event(state, event_id).await?;
    if event.created_by != user.id {
        return Err(AppError::Forbidden(
            "Only the creator can manage this event".to_string(),
        ));
    }
    Ok(event)
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let events = state.store.list_events_by_creator(user.id).await?;
    Ok(success(EventsBody { events }))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<CreateEventRequest>,
) -> Result<Response, AppError> {
    let new_event = req.validate()?;

    let event = state
        .store
        .create_event(new_event, user.id, current_week_start())
        .await?;
    tracing::info!(event_id = %event.id, user_id = %user.id, "Event created");

    Ok(created(EventBody { event }))
}

/// GET /api/events/:id, the event with everything needed to render it
pub async fn get_event(
    State(state): State<AppState>,
    PathParam(event_id): PathParam<Uuid>,
) -> Result<Response, AppError> {
    let event = load_event(&state, event_id).await?;
    let participants = state.store.list_participants(event_id).await?;
    let availability = state.store.list_availability(event_id).await?;

    Ok(success(EventDetailsBody {
        event,
        participants,
        availability,
    }))
}

/// PATCH /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(event_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let current = load_own_event(&state, &user, event_id).await?;
    let update = req.validate(&current)?;
    let status_changed = update.status.is_some_and(|s| s != current.status);

    let event = state
        .store
        .update_event(event_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))?;

    if status_changed {
        tracing::info!(event_id = %event.id, status = %event.status, "Event status changed");
    }
    Ok(success(EventBody { event }))
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(event_id): PathParam<Uuid>,
) -> Result<Response, AppError> {
    load_own_event(&state, &user, event_id).await?;

    if !state.store.delete_event(event_id).await? {
        return Err(AppError::NotFound(format!(
            "Event '{}' was not found",
            event_id
        )));
    }
    tracing::info!(event_id = %event_id, "Event deleted");

    Ok(empty_success())
}

/// GET /api/events/:id/analytics
pub async fn get_event_analytics(
    State(state): State<AppState>,
    PathParam(event_id): PathParam<Uuid>,
) -> Result<Response, AppError> {
    let event = load_event(&state, event_id).await?;
    let participants = state.store.list_participants(event_id).await?;
    let availability = state.store.list_availability(event_id).await?;

    let analytics = aggregate(&event, &participants, &availability);
    Ok(success(AnalyticsBody { analytics }))
}
