//! Verification of access tokens issued by the external auth provider.
//!
//! Sign-up, sign-in and token refresh happen at the provider. This server only checks the
//! HS256 signature and expiry of the bearer token and takes the user id from `sub`.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// The signed-in user making the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Provider tokens carry an audience this server does not pin.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AppError> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                AppError::AuthError("Invalid or expired token".to_string())
            })?;

        let id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AppError::AuthError("Invalid user ID in token".to_string()))?;

        Ok(AuthUser {
            id,
            email: token_data.claims.email,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Unauthorized".to_string()))?
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::AuthError("Invalid authorization header".to_string()))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        state.auth.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-key-for-testing";

    fn token(sub: &str, secret: &str, expires_in: Duration) -> String {
        let claims = AccessTokenClaims {
            sub: sub.to_string(),
            email: Some("ana@example.com".to_string()),
            exp: (Utc::now() + expires_in).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let user_id = Uuid::new_v4();
        let verifier = TokenVerifier::new(SECRET);
        let user = verifier
            .verify(&token(&user_id.to_string(), SECRET, Duration::minutes(15)))
            .unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_reject_wrong_secret_and_expired_token() {
        let verifier = TokenVerifier::new(SECRET);
        let user_id = Uuid::new_v4().to_string();

        let forged = token(&user_id, "another-secret", Duration::minutes(15));
        assert!(matches!(
            verifier.verify(&forged),
            Err(AppError::AuthError(_))
        ));

        let expired = token(&user_id, SECRET, Duration::hours(-2));
        assert!(matches!(
            verifier.verify(&expired),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_reject_non_uuid_subject() {
        let verifier = TokenVerifier::new(SECRET);
        let result = verifier.verify(&token("user-42", SECRET, Duration::minutes(15)));
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");

        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer_token(&parts).is_err());

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert!(bearer_token(&parts).is_err());
    }
}
