use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const MAX_PARTICIPANT_NAME_LEN: usize = 100;

/// Display colors handed out to participants.
pub const PARTICIPANT_COLORS: [&str; 6] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateParticipantRequest {
    pub event_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub event_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub color: String,
}

impl CreateParticipantRequest {
    pub fn validate(self) -> Result<NewParticipant, AppError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let (Some(event_id), Some(name)) = (self.event_id, name) else {
            return Err(AppError::ValidationError(
                "Missing required fields: event_id, name".to_string(),
            ));
        };
        if name.chars().count() > MAX_PARTICIPANT_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Name must be at most {} characters",
                MAX_PARTICIPANT_NAME_LEN
            )));
        }

        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(AppError::ValidationError(format!(
                    "Invalid email address '{}'",
                    email
                )));
            }
        }

        Ok(NewParticipant {
            event_id,
            name: name.to_string(),
            email,
            color: random_color().to_string(),
        })
    }
}

pub fn random_color() -> &'static str {
    PARTICIPANT_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PARTICIPANT_COLORS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_assigns_palette_color() {
        let participant = CreateParticipantRequest {
            event_id: Some(Uuid::new_v4()),
            name: Some(" Ada ".to_string()),
            email: Some("".to_string()),
        }
        .validate()
        .unwrap();

        assert_eq!(participant.name, "Ada");
        assert_eq!(participant.email, None);
        assert!(PARTICIPANT_COLORS.contains(&participant.color.as_str()));
    }

    #[test]
    fn test_name_and_event_are_required() {
        let missing_name = CreateParticipantRequest {
            event_id: Some(Uuid::new_v4()),
            name: Some("  ".to_string()),
            email: None,
        };
        assert!(matches!(
            missing_name.validate(),
            Err(AppError::ValidationError(_))
        ));

        let missing_event = CreateParticipantRequest {
            event_id: None,
            name: Some("Grace".to_string()),
            email: None,
        };
        assert!(matches!(
            missing_event.validate(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        let req = CreateParticipantRequest {
            event_id: Some(Uuid::new_v4()),
            name: Some("Grace".to_string()),
            email: Some("grace.example.com".to_string()),
        };
        assert!(req.validate().is_err());
    }
}
