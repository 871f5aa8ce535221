//! Session token codec
//!
//! A token is `base64(email:issued_at_millis)`. It carries no signature:
//! anyone who knows the admin email can mint one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Why a token could not be decoded
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not valid base64")]
    Base64,
    #[error("token is not valid UTF-8")]
    Utf8,
    #[error("token has no ':' separator")]
    MissingSeparator,
    #[error("token timestamp is not a valid epoch millisecond value")]
    Timestamp,
}

/// Decoded session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn issue(email: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            issued_at,
        }
    }

    /// Opaque string form
    pub fn encode(&self) -> String {
        STANDARD.encode(format!(
            "{}:{}",
            self.email,
            self.issued_at.timestamp_millis()
        ))
    }

    /// Parse the opaque form, splitting on the first ':'
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let bytes = STANDARD.decode(token.trim()).map_err(|_| TokenError::Base64)?;
        let decoded = String::from_utf8(bytes).map_err(|_| TokenError::Utf8)?;
        let (email, millis) = decoded
            .split_once(':')
            .ok_or(TokenError::MissingSeparator)?;

        let millis: i64 = millis.parse().map_err(|_| TokenError::Timestamp)?;
        let issued_at = DateTime::from_timestamp_millis(millis).ok_or(TokenError::Timestamp)?;

        Ok(Self {
            email: email.to_string(),
            issued_at,
        })
    }

    /// `now - issued_at >= ttl`. A token issued in the future is not expired.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.issued_at).to_std() {
            Ok(age) => age >= ttl,
            Err(_) => false,
        }
    }

    /// When the token stops being accepted
    pub fn expires_at(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.issued_at.checked_add_signed(ttl))
    }
}
