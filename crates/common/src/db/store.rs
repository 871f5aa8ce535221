//! Remote store seams
//!
//! `ProjectStore` is the projects table, `BlobStore` the image bucket.
//! Each method is a single round trip; implementations do not retry.

use crate::db::models::{NewProject, Project, ProjectChanges};
use crate::errors::Result;
use async_trait::async_trait;

/// The keyed reads the table supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectQuery {
    /// Every row, newest first
    All,
    /// Rows with `featured = true`, newest first
    Featured,
    /// The row with this primary key
    ById(i64),
}

impl ProjectQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectQuery::All => "all",
            ProjectQuery::Featured => "featured",
            ProjectQuery::ById(_) => "by_id",
        }
    }
}

/// Table operations against `projects`
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Run one of the select queries
    async fn select(&self, query: ProjectQuery) -> Result<Vec<Project>>;

    /// Insert one row and return it as stored
    async fn insert(&self, project: &NewProject) -> Result<Project>;

    /// Insert several rows in one request
    async fn insert_batch(&self, projects: &[NewProject]) -> Result<Vec<Project>>;

    /// Update by id; `None` when no row matched
    async fn update(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>>;

    /// Delete by id; `None` when no row matched
    async fn delete(&self, id: i64) -> Result<Option<Project>>;

    /// Exact number of rows
    async fn count(&self) -> Result<u64>;
}

/// Object storage for project images
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `path` (relative to the bucket)
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Remove objects by bucket-relative path
    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// Publicly resolvable URL of an object
    fn public_url(&self, path: &str) -> String;
}
