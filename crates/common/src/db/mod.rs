//! Data access layer for Folio
//!
//! Provides:
//! - Project models and write payloads
//! - Store traits for the hosted table and image bucket
//! - Supabase and in-memory store implementations
//! - The project repository

pub mod memory;
pub mod models;
mod repository;
mod seed;
pub mod store;
pub mod supabase;

pub use memory::MemoryStore;
pub use repository::{ProjectRepository, SeedOutcome, StoreStatus};
pub use store::{BlobStore, ProjectQuery, ProjectStore};
pub use supabase::SupabaseStore;

use crate::config::StoreConfig;
use crate::errors::{AppError, Result};
use std::sync::Arc;
use tracing::info;

/// Build a repository for the configured store provider
pub fn create_repository(config: &StoreConfig) -> Result<ProjectRepository> {
    match config.provider.as_str() {
        "supabase" => {
            info!(url = %config.url, table = %config.table, "Using Supabase store");
            let store = Arc::new(SupabaseStore::new(config)?);
            Ok(ProjectRepository::new(store.clone(), store))
        }
        "memory" => {
            info!("Using in-memory store");
            let store = Arc::new(MemoryStore::new());
            Ok(ProjectRepository::new(store.clone(), store))
        }
        other => Err(AppError::Configuration {
            message: format!("Unknown store provider: {}", other),
        }),
    }
}
