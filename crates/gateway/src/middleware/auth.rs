//! Bearer session extractor for admin routes
//!
//! Applies the same checks the admin console does: the token must decode,
//! name the configured admin and be younger than the session TTL.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use folio_common::{
    auth::{SessionCheck, SessionToken},
    errors::AppError,
    metrics,
};

use crate::AppState;

/// A request carrying a valid admin session token
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionToken);

/// Extract the token from a `Bearer` authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let raw = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must be a Bearer token".to_string(),
        })?;

        let check = SessionCheck::classify(
            raw,
            &state.config.admin.email,
            state.config.session.ttl(),
            Utc::now(),
        );
        metrics::record_session_check(check.outcome());

        match check {
            SessionCheck::Valid(token) => Ok(AdminSession(token)),
            rejected => {
                tracing::warn!(outcome = rejected.outcome(), "Rejected admin token");
                Err(AppError::SessionInvalid {
                    reason: rejected.reason(),
                })
            }
        }
    }
}
