use axum::{extract::State, response::Response};

use crate::auth::AuthUser;
use crate::state::AppState;
use crate::usage::{current_week_start, WeeklyUsage};
use crate::utils::error::AppError;
use crate::utils::response::success;

/// GET /api/usage/events-this-week
pub async fn events_this_week(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let week_start = current_week_start();
    let count = state
        .store
        .count_events_created_since(user.id, week_start)
        .await?;

    Ok(success(WeeklyUsage::new(count, week_start)))
}
