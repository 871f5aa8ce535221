//! Admin session handling
//!
//! Provides:
//! - Credential check against the single configured admin identity
//! - Session token issue and validation (24h lifetime by default)
//! - Periodic re-validation published through a watch channel
//!
//! The credential check and the token are client-side only. The token is
//! unsigned, so this is a convenience gate and not a security boundary.

mod store;
mod token;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, LOGIN_KEY, TOKEN_KEY};
pub use token::{SessionToken, TokenError};

use crate::clock::{Clock, SystemClock};
use crate::config::AdminConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default session lifetime
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default re-validation interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Exact, case-sensitive match against the configured admin identity
pub fn credentials_match(admin: &AdminConfig, email: &str, password: &str) -> bool {
    email == admin.email && password == admin.password
}

/// Detailed outcome of a session check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Valid(SessionToken),
    /// Flag or token absent. Nothing is erased.
    Missing,
    Malformed(TokenError),
    Expired { issued_at: DateTime<Utc> },
    WrongIdentity { email: String },
    /// Session storage could not be read
    Unreadable { message: String },
}

impl SessionCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionCheck::Valid(_))
    }

    /// Label used for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            SessionCheck::Valid(_) => "valid",
            SessionCheck::Missing => "missing",
            SessionCheck::Malformed(_) => "malformed",
            SessionCheck::Expired { .. } => "expired",
            SessionCheck::WrongIdentity { .. } => "wrong_identity",
            SessionCheck::Unreadable { .. } => "unreadable",
        }
    }

    /// Classify a raw token against the admin identity at `now`
    pub fn classify(raw: &str, admin_email: &str, ttl: Duration, now: DateTime<Utc>) -> Self {
        let token = match SessionToken::decode(raw) {
            Ok(token) => token,
            Err(e) => return SessionCheck::Malformed(e),
        };

        if token.is_expired(now, ttl) {
            return SessionCheck::Expired {
                issued_at: token.issued_at,
            };
        }

        if token.email != admin_email {
            return SessionCheck::WrongIdentity { email: token.email };
        }

        SessionCheck::Valid(token)
    }

    /// Reason text for a rejected session
    pub fn reason(&self) -> String {
        match self {
            SessionCheck::Valid(_) => "valid".to_string(),
            SessionCheck::Missing => "no active session".to_string(),
            SessionCheck::Malformed(e) => format!("malformed token: {}", e),
            SessionCheck::Expired { issued_at } => {
                format!("session issued at {} has expired", issued_at.to_rfc3339())
            }
            SessionCheck::WrongIdentity { .. } => "token belongs to another identity".to_string(),
            SessionCheck::Unreadable { message } => format!("session storage unreadable: {}", message),
        }
    }
}

/// Observable session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated {
        email: String,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    },
}

/// Handle to a running re-validation loop
pub struct SessionWatch {
    pub receiver: watch::Receiver<bool>,
    pub handle: JoinHandle<()>,
}

/// Admin session manager over client-local storage
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    admin: AdminConfig,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, admin: AdminConfig, ttl: Duration) -> Self {
        Self::with_clock(store, admin, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn SessionStore>,
        admin: AdminConfig,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            admin,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Exact match on both email and password. Writes nothing on mismatch.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        if !credentials_match(&self.admin, email, password) {
            metrics::record_login(false);
            tracing::warn!(email = %email, "Admin login rejected");
            return Err(AppError::Unauthorized {
                message: "Invalid email or password".to_string(),
            });
        }

        let token = SessionToken::issue(email, self.clock.now()).encode();
        self.store.write(TOKEN_KEY, &token)?;
        self.store.write(LOGIN_KEY, "true")?;

        metrics::record_login(true);
        tracing::info!(email = %email, "Admin logged in");
        Ok(token)
    }

    /// Erase both persisted values
    pub fn logout(&self) -> Result<()> {
        self.store.clear(TOKEN_KEY)?;
        self.store.clear(LOGIN_KEY)?;
        tracing::info!("Admin logged out");
        Ok(())
    }

    pub fn validate(&self) -> bool {
        self.check().is_valid()
    }

    /// Inspect the stored session. Invalid sessions are erased.
    pub fn check(&self) -> SessionCheck {
        let check = match self.read_session() {
            Ok(Some(raw)) => {
                SessionCheck::classify(&raw, &self.admin.email, self.ttl, self.clock.now())
            }
            Ok(None) => SessionCheck::Missing,
            Err(e) => {
                tracing::warn!(error = %e, "Session storage unreadable");
                SessionCheck::Unreadable {
                    message: e.to_string(),
                }
            }
        };

        metrics::record_session_check(check.outcome());

        if !matches!(check, SessionCheck::Valid(_) | SessionCheck::Missing) {
            tracing::warn!(outcome = check.outcome(), "Clearing invalid admin session");
            if let Err(e) = self.logout() {
                tracing::error!(error = %e, "Failed to clear session storage");
            }
        }

        check
    }

    /// Token of the current session, or `SessionInvalid`
    pub fn require(&self) -> Result<String> {
        match self.check() {
            SessionCheck::Valid(token) => Ok(token.encode()),
            other => Err(AppError::SessionInvalid {
                reason: other.reason(),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.check() {
            SessionCheck::Valid(token) => SessionState::Authenticated {
                expires_at: token.expires_at(self.ttl),
                email: token.email,
                issued_at: token.issued_at,
            },
            _ => SessionState::Anonymous,
        }
    }

    /// Re-validate every `interval` and publish the result.
    /// The loop stops once every receiver is dropped. A zero interval is
    /// rejected.
    pub fn watch(self: &Arc<Self>, interval: Duration) -> Result<SessionWatch> {
        if interval.is_zero() {
            return Err(AppError::Configuration {
                message: "session poll interval must be non-zero".to_string(),
            });
        }

        let (tx, receiver) = watch::channel(self.validate());
        let manager = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }

                let valid = manager.validate();
                tx.send_if_modified(|current| {
                    if *current == valid {
                        return false;
                    }
                    *current = valid;
                    true
                });

                if !valid {
                    tracing::debug!("Session watch observed no valid session");
                }
            }
        });

        Ok(SessionWatch { receiver, handle })
    }

    /// Flag must read exactly "true" and a token must be present
    fn read_session(&self) -> Result<Option<String>> {
        let flag = self.store.read(LOGIN_KEY)?;
        if flag.as_deref() != Some("true") {
            return Ok(None);
        }
        self.store.read(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use chrono::TimeZone;

    const EMAIL: &str = "duku@joben.eu";
    const PASSWORD: &str = "Bigboss2025";

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn manager() -> (SessionManager, Arc<MemorySessionStore>, Arc<ManualClock>) {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let manager = SessionManager::with_clock(
            store.clone(),
            AdminConfig::default(),
            DEFAULT_SESSION_TTL,
            clock.clone(),
        );
        (manager, store, clock)
    }

    fn is_empty(store: &MemorySessionStore) -> bool {
        store.read(TOKEN_KEY).unwrap().is_none() && store.read(LOGIN_KEY).unwrap().is_none()
    }

    #[test]
    fn test_login_logout_scenario() {
        let (manager, store, _) = manager();

        let token = manager.login(EMAIL, PASSWORD).unwrap();
        assert_eq!(store.read(TOKEN_KEY).unwrap(), Some(token.clone()));
        assert_eq!(store.read(LOGIN_KEY).unwrap().as_deref(), Some("true"));

        let decoded = STANDARD.decode(&token).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            format!("{}:{}", EMAIL, start().timestamp_millis())
        );
        assert!(manager.validate());
        assert_eq!(manager.require().unwrap(), token);

        manager.logout().unwrap();
        assert!(is_empty(&store));
        assert!(!manager.validate());
        assert_eq!(manager.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_wrong_credentials_write_nothing() {
        let (manager, store, _) = manager();

        let err = manager.login(EMAIL, "bigboss2025").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
        assert!(matches!(
            manager.login("Duku@joben.eu", PASSWORD),
            Err(AppError::Unauthorized { .. })
        ));
        assert!(is_empty(&store));
    }

    #[test]
    fn test_session_expires_after_ttl() {
        let (manager, store, clock) = manager();
        manager.login(EMAIL, PASSWORD).unwrap();

        clock.set(start() + chrono::Duration::hours(24) - chrono::Duration::seconds(1));
        assert!(manager.validate());

        clock.set(start() + chrono::Duration::hours(24) + chrono::Duration::seconds(1));
        assert!(matches!(manager.check(), SessionCheck::Expired { .. }));
        assert!(is_empty(&store));
    }

    #[test]
    fn test_tampered_token_is_cleared() {
        let (manager, store, _) = manager();
        manager.login(EMAIL, PASSWORD).unwrap();

        store.write(TOKEN_KEY, "!!definitely not base64!!").unwrap();
        assert!(matches!(manager.check(), SessionCheck::Malformed(TokenError::Base64)));
        assert!(is_empty(&store));
    }

    #[test]
    fn test_unparsable_timestamp_is_cleared() {
        let (manager, store, _) = manager();
        store.write(LOGIN_KEY, "true").unwrap();
        store
            .write(TOKEN_KEY, &STANDARD.encode(format!("{}:soon", EMAIL)))
            .unwrap();

        assert!(!manager.validate());
        assert!(is_empty(&store));
    }

    #[test]
    fn test_case_variant_email_is_rejected() {
        let (manager, store, _) = manager();
        store.write(LOGIN_KEY, "true").unwrap();
        store
            .write(
                TOKEN_KEY,
                &SessionToken::issue("DUKU@joben.eu", start()).encode(),
            )
            .unwrap();

        assert_eq!(
            manager.check(),
            SessionCheck::WrongIdentity {
                email: "DUKU@joben.eu".to_string()
            }
        );
        assert!(is_empty(&store));
    }

    #[test]
    fn test_missing_flag_is_not_a_session() {
        let (manager, store, _) = manager();
        store
            .write(TOKEN_KEY, &SessionToken::issue(EMAIL, start()).encode())
            .unwrap();

        assert_eq!(manager.check(), SessionCheck::Missing);
        assert!(store.read(TOKEN_KEY).unwrap().is_some());
        assert!(matches!(
            manager.require(),
            Err(AppError::SessionInvalid { .. })
        ));
    }

    #[test]
    fn test_state_reports_expiry() {
        let (manager, _, _) = manager();
        manager.login(EMAIL, PASSWORD).unwrap();

        assert_eq!(
            manager.state(),
            SessionState::Authenticated {
                email: EMAIL.to_string(),
                issued_at: start(),
                expires_at: Some(start() + chrono::Duration::hours(24)),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_publishes_expiry() {
        let (manager, store, clock) = manager();
        manager.login(EMAIL, PASSWORD).unwrap();

        let manager = Arc::new(manager);
        let mut session = manager.watch(DEFAULT_POLL_INTERVAL).unwrap();
        assert!(*session.receiver.borrow());

        clock.advance(chrono::Duration::hours(25));
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        session.receiver.changed().await.unwrap();

        assert!(!*session.receiver.borrow());
        assert!(is_empty(&store));

        drop(session.receiver);
        session.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_rejects_zero_interval() {
        let (manager, _, _) = manager();
        let manager = Arc::new(manager);

        assert!(matches!(
            manager.watch(Duration::ZERO),
            Err(AppError::Configuration { .. })
        ));
    }
}
