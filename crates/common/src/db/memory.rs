//! In-process store used by tests and the `memory` provider

use crate::clock::{Clock, SystemClock};
use crate::db::models::{NewProject, Project, ProjectChanges};
use crate::db::store::{BlobStore, ProjectQuery, ProjectStore};
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    rows: BTreeMap<i64, Project>,
    last_id: i64,
    blobs: HashMap<String, (Vec<u8>, String)>,
}

/// Table + bucket held in memory, assigning ids and timestamps like the
/// hosted store does
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` for `created_at` / `updated_at` on insert
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stored bytes and content type of an object
    pub fn blob(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.tables().blobs.get(path).cloned()
    }

    fn insert_row(&self, tables: &mut Tables, project: &NewProject) -> Project {
        tables.last_id += 1;
        let now = self.clock.now();
        let row = Project {
            id: tables.last_id,
            title: project.title.clone(),
            description: project.description.clone(),
            image: project.image.clone(),
            tech: project.tech.clone(),
            github: project.github.clone(),
            demo: project.demo.clone(),
            featured: project.featured,
            created_at: now,
            updated_at: now,
        };
        tables.rows.insert(row.id, row.clone());
        row
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn select(&self, query: ProjectQuery) -> Result<Vec<Project>> {
        let tables = self.tables();

        if let ProjectQuery::ById(id) = query {
            return Ok(tables.rows.get(&id).cloned().into_iter().collect());
        }

        let mut rows: Vec<Project> = tables
            .rows
            .values()
            .filter(|p| query != ProjectQuery::Featured || p.featured)
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(rows)
    }

    async fn insert(&self, project: &NewProject) -> Result<Project> {
        let mut tables = self.tables();
        Ok(self.insert_row(&mut tables, project))
    }

    async fn insert_batch(&self, projects: &[NewProject]) -> Result<Vec<Project>> {
        let mut tables = self.tables();
        Ok(projects
            .iter()
            .map(|p| self.insert_row(&mut tables, p))
            .collect())
    }

    async fn update(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>> {
        let mut tables = self.tables();
        Ok(tables.rows.get_mut(&id).map(|row| {
            changes.patch.apply_to(row);
            row.updated_at = changes.updated_at;
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<Project>> {
        Ok(self.tables().rows.remove(&id))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables().rows.len() as u64)
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.tables()
            .blobs
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let mut tables = self.tables();
        for path in paths {
            tables.blobs.remove(path);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://project-images/{}", path)
    }
}
