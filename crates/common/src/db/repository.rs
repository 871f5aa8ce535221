//! Repository pattern for project data access
//!
//! Translates domain calls into store queries and stamps `updated_at`.
//! It holds no state of its own and performs no payload validation; callers
//! validate before calling `create`/`update`.

use crate::clock::{Clock, SystemClock};
use crate::db::models::{NewProject, Project, ProjectChanges, ProjectPatch};
use crate::db::seed;
use crate::db::store::{BlobStore, ProjectQuery, ProjectStore};
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a connection check against the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of seeding the sample projects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    Inserted { count: usize },
    AlreadySeeded,
}

/// Repository for project rows and images
#[derive(Clone)]
pub struct ProjectRepository {
    store: Arc<dyn ProjectStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl ProjectRepository {
    /// Create a repository over the given table and bucket
    pub fn new(store: Arc<dyn ProjectStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_clock(store, blobs, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ProjectStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, blobs, clock }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All projects, newest first
    pub async fn list(&self) -> Result<Vec<Project>> {
        self.store
            .select(ProjectQuery::All)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error fetching projects"))
    }

    /// Featured projects, newest first
    pub async fn list_featured(&self) -> Result<Vec<Project>> {
        self.store
            .select(ProjectQuery::Featured)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error fetching featured projects"))
    }

    /// One project by primary key
    pub async fn get(&self, id: i64) -> Result<Project> {
        ensure_id(id)?;

        self.store
            .select(ProjectQuery::ById(id))
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error fetching project"))?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::project_not_found(id))
    }

    /// Exact row count
    pub async fn count(&self) -> Result<u64> {
        self.store.count().await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a project; the store assigns id and timestamps
    pub async fn create(&self, project: &NewProject) -> Result<Project> {
        let created = self
            .store
            .insert(project)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error creating project"))?;

        tracing::info!(id = created.id, title = %created.title, "Project created");
        Ok(created)
    }

    /// Merge `patch` into the row and refresh `updated_at`
    pub async fn update(&self, id: i64, patch: &ProjectPatch) -> Result<Project> {
        ensure_id(id)?;

        let changes = ProjectChanges {
            patch: patch.clone(),
            updated_at: self.clock.now(),
        };

        let updated = self
            .store
            .update(id, &changes)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error updating project"))?
            .ok_or_else(|| AppError::project_not_found(id))?;

        tracing::info!(id, "Project updated");
        Ok(updated)
    }

    /// Hard delete. A missing row is reported, not ignored.
    pub async fn delete(&self, id: i64) -> Result<()> {
        ensure_id(id)?;

        self.store
            .delete(id)
            .await
            .inspect_err(|e| tracing::error!(id, error = %e, "Error deleting project"))?
            .ok_or_else(|| AppError::project_not_found(id))?;

        tracing::info!(id, "Project deleted");
        Ok(())
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Store an image for `project_id` and return its public URL.
    ///
    /// The object name is `projects/{project_id}-{epoch_millis}.{ext}`, with
    /// the extension taken from `file_name`.
    pub async fn upload_image(
        &self,
        project_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let ext = extension(file_name);
        let path = format!(
            "projects/{}-{}.{}",
            project_id,
            self.clock.now().timestamp_millis(),
            ext
        );

        self.blobs
            .upload(&path, bytes, content_type(&ext))
            .await
            .inspect_err(|e| tracing::error!(project_id, error = %e, "Error uploading image"))?;

        tracing::info!(project_id, path = %path, "Image uploaded");
        Ok(self.blobs.public_url(&path))
    }

    /// Remove an image given its public URL
    pub async fn delete_image(&self, url: &str) -> Result<()> {
        let path = object_path(url).ok_or_else(|| AppError::Validation {
            message: format!("Not an image URL: {}", url),
            field: Some("url".to_string()),
        })?;

        self.blobs
            .remove(&[path.clone()])
            .await
            .inspect_err(|e| tracing::error!(path = %path, error = %e, "Error deleting image"))?;

        tracing::info!(path = %path, "Image deleted");
        Ok(())
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Connection check: total and featured counts, or the failure text
    pub async fn status(&self) -> StoreStatus {
        let start = Instant::now();

        let counts = async {
            let total = self.store.count().await?;
            let featured = self.store.select(ProjectQuery::Featured).await?.len() as u64;
            Ok::<_, AppError>((total, featured))
        };

        match counts.await {
            Ok((total, featured)) => StoreStatus {
                connected: true,
                total: Some(total),
                featured: Some(featured),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Store connection check failed");
                StoreStatus {
                    connected: false,
                    total: None,
                    featured: None,
                    latency_ms: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Insert the sample projects when the table is empty
    pub async fn seed_samples(&self) -> Result<SeedOutcome> {
        if self.store.count().await? > 0 {
            tracing::info!("Sample projects already present, skipping seed");
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let inserted = self
            .store
            .insert_batch(&seed::sample_projects())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error seeding projects"))?;

        tracing::info!(count = inserted.len(), "Sample projects inserted");
        Ok(SeedOutcome::Inserted {
            count: inserted.len(),
        })
    }
}

fn ensure_id(id: i64) -> Result<()> {
    if id > 0 {
        Ok(())
    } else {
        Err(AppError::Validation {
            message: format!("id must be a positive integer, got {}", id),
            field: Some("id".to_string()),
        })
    }
}

fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.bytes().all(|b| b.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}

fn content_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Last two segments of a public URL: `projects/<file>`
fn object_path(url: &str) -> Option<String> {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let file = segments.next().filter(|s| !s.is_empty())?;
    let folder = segments.next().filter(|s| !s.is_empty() && !s.ends_with(':'))?;
    Some(format!("{}/{}", folder, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::memory::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn repository() -> (ProjectRepository, Arc<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let repo = ProjectRepository::with_clock(store.clone(), store.clone(), clock.clone());
        (repo, store, clock)
    }

    #[tokio::test]
    async fn test_create_then_get_returns_input_plus_assigned_fields() {
        let (repo, _, _) = repository();

        let input = NewProject {
            title: "X".into(),
            description: "Y".into(),
            image: "https://img.example/x.png".into(),
            tech: vec!["A".into(), "B".into()],
            github: Some("https://github.com/x/y".into()),
            demo: None,
            featured: false,
        };

        let created = repo.create(&input).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.title, input.title);
        assert_eq!(fetched.description, input.description);
        assert_eq!(fetched.image, input.image);
        assert_eq!(fetched.tech, input.tech);
        assert_eq!(fetched.github, input.github);
        assert_eq!(fetched.demo, input.demo);
        assert_eq!(fetched.featured, input.featured);
    }

    #[tokio::test]
    async fn test_update_sets_featured_and_advances_updated_at() {
        let (repo, _, clock) = repository();
        let created = repo.create(&NewProject::new("X", "Y")).await.unwrap();

        clock.advance(Duration::seconds(1));
        repo.update(created.id, &ProjectPatch::featured(true)).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap();
        assert!(fetched.featured);
        assert!(fetched.updated_at > created.updated_at);
        assert_eq!(fetched.title, "X");
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let (repo, _, _) = repository();
        let err = repo.update(42, &ProjectPatch::featured(true)).await.unwrap_err();
        assert_eq!(err, AppError::project_not_found(42));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (repo, _, _) = repository();
        let created = repo.create(&NewProject::new("X", "Y")).await.unwrap();

        repo.delete(created.id).await.unwrap();

        let err = repo.get(created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_reported() {
        let (repo, _, _) = repository();
        assert!(repo.delete(99).await.is_err());
    }

    #[tokio::test]
    async fn test_non_positive_id_is_rejected() {
        let (repo, _, _) = repository();
        assert!(matches!(
            repo.get(0).await.unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(matches!(
            repo.delete(-1).await.unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_filters_featured() {
        let (repo, _, clock) = repository();

        let first = repo.create(&NewProject::new("first", "d").featured(true)).await.unwrap();
        clock.advance(Duration::minutes(1));
        let second = repo.create(&NewProject::new("second", "d")).await.unwrap();
        clock.advance(Duration::minutes(1));
        let third = repo.create(&NewProject::new("third", "d").featured(true)).await.unwrap();

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let featured: Vec<i64> = repo.list_featured().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(featured, vec![third.id, first.id]);
    }

    #[tokio::test]
    async fn test_featured_toggle_scenario() {
        let (repo, _, _) = repository();

        let created = repo
            .create(&NewProject::new("X", "Y").with_tech(["A", "B"]))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert!(repo.list_featured().await.unwrap().iter().all(|p| p.id != created.id));

        repo.update(created.id, &ProjectPatch::featured(true)).await.unwrap();
        assert!(repo.list_featured().await.unwrap().iter().any(|p| p.id == created.id));
    }

    #[tokio::test]
    async fn test_upload_image_names_object_after_project_and_time() {
        let (repo, store, clock) = repository();
        let millis = clock.now().timestamp_millis();

        let url = repo.upload_image(7, "cover.PNG", vec![1, 2, 3]).await.unwrap();

        let path = format!("projects/7-{}.png", millis);
        assert_eq!(url, format!("memory://project-images/{}", path));

        let (bytes, content_type) = store.blob(&path).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_delete_image_uses_last_two_segments() {
        let (repo, store, _) = repository();
        let url = repo.upload_image(3, "shot.webp", vec![9]).await.unwrap();

        repo.delete_image(&url).await.unwrap();
        assert!(store.blob(&url.replace("memory://project-images/", "")).is_none());
    }

    #[tokio::test]
    async fn test_seed_only_runs_on_empty_table() {
        let (repo, _, _) = repository();

        assert_eq!(
            repo.seed_samples().await.unwrap(),
            SeedOutcome::Inserted { count: 3 }
        );
        assert_eq!(repo.seed_samples().await.unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.list_featured().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_status_reports_counts() {
        let (repo, _, _) = repository();
        repo.create(&NewProject::new("a", "b").featured(true)).await.unwrap();
        repo.create(&NewProject::new("c", "d")).await.unwrap();

        let status = repo.status().await;
        assert!(status.connected);
        assert_eq!(status.total, Some(2));
        assert_eq!(status.featured, Some(1));
        assert!(status.error.is_none());
    }

    #[test]
    fn test_extension_and_object_path() {
        assert_eq!(extension("photo.JPG"), "jpg");
        assert_eq!(extension("README"), "bin");
        assert_eq!(extension("archive."), "bin");
        assert_eq!(extension("x.png?upsert=true"), "bin");
        assert_eq!(extension("x.png#a"), "bin");
        assert_eq!(extension("shot.v2/evil"), "bin");
        assert_eq!(extension("clip.mp4"), "mp4");
        assert_eq!(
            object_path("https://x.supabase.co/storage/v1/object/public/project-images/projects/1-2.png"),
            Some("projects/1-2.png".to_string())
        );
        assert_eq!(object_path("nothing"), None);
    }
}
