//! Configuration management for Folio services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values
//!
//! The store URL and public API key have no defaults: a process that cannot
//! find them fails at startup.

use crate::errors::{AppError, Result};
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration (gateway side)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote store configuration
    pub store: StoreConfig,

    /// Query cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Admin session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// The single admin identity
    #[serde(default)]
    pub admin: AdminConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Admin console configuration (client side)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Gateway the console talks to
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Admin session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// The single admin identity
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted image upload size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store provider: supabase, memory
    #[serde(default = "default_store_provider")]
    pub provider: String,

    /// Base URL of the hosted backend (e.g. https://xyz.supabase.co)
    pub url: String,

    /// Public (anon) API key
    pub anon_key: String,

    /// Table holding the projects
    #[serde(default = "default_table")]
    pub table: String,

    /// Bucket holding project images
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// HTTP client timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Age after which a cached query result is refetched
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Token lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,

    /// Re-validation interval for watchers in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// File backing the client-local session values
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    /// Admin email (exact, case-sensitive match)
    #[serde(default = "default_admin_email")]
    pub email: String,

    /// Admin password (plaintext comparison)
    #[serde(default = "default_admin_password")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Base URL of the folio gateway
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Serve Prometheus metrics at /metrics
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_body_limit() -> usize { 10 * 1024 * 1024 }
fn default_store_provider() -> String { "supabase".to_string() }
fn default_table() -> String { "projects".to_string() }
fn default_bucket() -> String { "project-images".to_string() }
fn default_store_timeout() -> u64 { 30 }
fn default_stale_after() -> u64 { 300 }
fn default_session_ttl() -> u64 { 24 * 60 * 60 }
fn default_poll_interval() -> u64 { 60 }
fn default_session_path() -> PathBuf { PathBuf::from(".folio/session.json") }
fn default_admin_email() -> String { "duku@joben.eu".to_string() }
fn default_admin_password() -> String { "Bigboss2025".to_string() }
fn default_gateway_url() -> String { "http://localhost:8080".to_string() }
fn default_gateway_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_enabled() -> bool { true }
fn default_service_name() -> String { "folio".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_after_secs: default_stale_after() }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            poll_interval_secs: default_poll_interval(),
            path: default_session_path(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            timeout_secs: default_gateway_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_metrics_enabled(),
            service_name: default_service_name(),
        }
    }
}

/// Layered sources shared by every Folio binary
fn layered() -> ConfigBuilder<DefaultState> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    Config::builder()
        // Load base config file
        .add_source(File::with_name("config/default").required(false))
        // Load environment-specific config
        .add_source(File::with_name(&format!("config/{}", env)).required(false))
        // Load local overrides
        .add_source(File::with_name("config/local").required(false))
        // e.g., APP__STORE__URL=https://xyz.supabase.co
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let config: Self = layered().build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that deserialize but cannot work
    pub fn validate(&self) -> Result<()> {
        if self.store.provider == "supabase" {
            if self.store.url.trim().is_empty() {
                return Err(missing("store.url"));
            }
            if self.store.anon_key.trim().is_empty() {
                return Err(missing("store.anon_key"));
            }
        }
        if self.admin.email.is_empty() || self.admin.password.is_empty() {
            return Err(missing("admin.email / admin.password"));
        }
        self.session.validate()
    }

    /// Staleness window of the project cache
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.cache.stale_after_secs)
    }

    /// HTTP timeout for store calls
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs)
    }
}

impl ClientConfig {
    /// Load the console configuration from the same layered sources
    pub fn load() -> Result<Self> {
        let config: Self = layered().build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()
    }
}

impl SessionConfig {
    /// Token lifetime as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Watcher interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(AppError::Configuration {
                message: "session.poll_interval_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn missing(field: &str) -> AppError {
    AppError::Configuration {
        message: format!("Missing required setting: {}", field),
    }
}
