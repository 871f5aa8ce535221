//! Project query cache
//!
//! Provides:
//! - Named query slots (`all`, `featured`, `by_id`) with a staleness window
//! - Request coalescing for concurrent readers of a stale slot
//! - Invalidation after every confirmed mutation, write-through on update
//!
//! Built once at startup and shared by `Arc`; there is no global instance.

mod slots;

pub use slots::QuerySlots;

use crate::db::models::{NewProject, Project, ProjectPatch};
use crate::db::{ProjectRepository, SeedOutcome};
use crate::errors::Result;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Default staleness window
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ListQuery {
    All,
    Featured,
}

/// A named cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    All,
    Featured,
    ById(i64),
}

/// Cached reads and cache-aware writes over a `ProjectRepository`
pub struct ProjectCache {
    repository: ProjectRepository,
    lists: QuerySlots<ListQuery, Arc<Vec<Project>>>,
    items: QuerySlots<i64, Arc<Project>>,
}

impl ProjectCache {
    /// Create a cache with the given staleness window
    pub fn new(repository: ProjectRepository, stale_after: Duration) -> Self {
        Self {
            repository,
            lists: QuerySlots::new("project_lists", stale_after),
            items: QuerySlots::new("project_items", stale_after),
        }
    }

    /// The repository behind the cache
    pub fn repository(&self) -> &ProjectRepository {
        &self.repository
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All projects, newest first
    pub async fn list(&self) -> Result<Arc<Vec<Project>>> {
        let repository = self.repository.clone();
        self.lists
            .get_or_fetch(ListQuery::All, move || async move {
                repository.list().await.map(Arc::new)
            })
            .await
    }

    /// Featured projects, newest first
    pub async fn list_featured(&self) -> Result<Arc<Vec<Project>>> {
        let repository = self.repository.clone();
        self.lists
            .get_or_fetch(ListQuery::Featured, move || async move {
                repository.list_featured().await.map(Arc::new)
            })
            .await
    }

    /// One project by id
    pub async fn get(&self, id: i64) -> Result<Arc<Project>> {
        let repository = self.repository.clone();
        self.items
            .get_or_fetch(id, move || async move {
                repository.get(id).await.map(Arc::new)
            })
            .await
    }

    /// Whether a slot currently holds a fresh value
    pub fn is_cached(&self, slot: CacheSlot) -> bool {
        match slot {
            CacheSlot::All => self.lists.is_fresh(&ListQuery::All),
            CacheSlot::Featured => self.lists.is_fresh(&ListQuery::Featured),
            CacheSlot::ById(id) => self.items.is_fresh(&id),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Validate, insert, then invalidate the list slots
    pub async fn create(&self, project: NewProject) -> Result<Project> {
        project.validate()?;

        let created = self.repository.create(&project).await?;
        self.invalidate_lists();
        Ok(created)
    }

    /// Validate, update, invalidate the lists, and write the row through
    pub async fn update(&self, id: i64, patch: ProjectPatch) -> Result<Project> {
        patch.validate()?;

        let updated = self.repository.update(id, &patch).await?;
        self.invalidate_lists();
        self.items.put(updated.id, Arc::new(updated.clone()));
        Ok(updated)
    }

    /// Delete, invalidate the lists, and evict the row
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.repository.delete(id).await?;
        self.invalidate_lists();
        self.items.invalidate(&id);
        Ok(())
    }

    /// Upload an image; slots are untouched until the row itself changes
    pub async fn upload_image(&self, project_id: i64, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        self.repository.upload_image(project_id, file_name, bytes).await
    }

    pub async fn delete_image(&self, url: &str) -> Result<()> {
        self.repository.delete_image(url).await
    }

    /// Seed sample rows, invalidating lists when anything was inserted
    pub async fn seed_samples(&self) -> Result<SeedOutcome> {
        let outcome = self.repository.seed_samples().await?;
        if matches!(outcome, SeedOutcome::Inserted { .. }) {
            self.invalidate_lists();
        }
        Ok(outcome)
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Drop the `all` and `featured` slots
    pub fn invalidate_lists(&self) {
        self.lists.invalidate(&ListQuery::All);
        self.lists.invalidate(&ListQuery::Featured);
    }

    /// Drop one slot
    pub fn invalidate(&self, slot: CacheSlot) {
        match slot {
            CacheSlot::All => self.lists.invalidate(&ListQuery::All),
            CacheSlot::Featured => self.lists.invalidate(&ListQuery::Featured),
            CacheSlot::ById(id) => self.items.invalidate(&id),
        }
    }

    /// Drop everything
    pub fn clear(&self) {
        self.lists.clear();
        self.items.clear();
    }
}
