//! Folio Common Library
//!
//! Shared code for the Folio gateway and admin console including:
//! - Project model and remote store access
//! - Query cache with request coalescing
//! - Admin session handling
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use auth::{SessionCheck, SessionManager, SessionState};
pub use cache::ProjectCache;
pub use config::{AppConfig, ClientConfig};
pub use db::models::Project;
pub use db::ProjectRepository;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
