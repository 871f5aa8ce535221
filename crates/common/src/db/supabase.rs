//! Supabase client: PostgREST for the table, Storage REST for images

use crate::config::StoreConfig;
use crate::db::models::{NewProject, Project, ProjectChanges};
use crate::db::store::{BlobStore, ProjectQuery, ProjectStore};
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// Typed client for the hosted table and bucket
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    table: String,
    bucket: String,
}

impl SupabaseStore {
    /// Build a client from store configuration
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Send one request, turning non-2xx answers into `AppError::Store`
    async fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response> {
        let start = Instant::now();

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Store {
                    message: format!("{} failed with {}: {}", op, status, body),
                    status: Some(status.as_u16()),
                })
            }
            Err(e) => Err(AppError::Store {
                message: format!("{} request failed: {}", op, e),
                status: None,
            }),
        };

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_store_request(op, elapsed, outcome.is_ok());

        match &outcome {
            Ok(response) => tracing::debug!(
                op,
                status = response.status().as_u16(),
                elapsed_ms = (elapsed * 1000.0) as u64,
                "Store request completed"
            ),
            Err(e) => tracing::error!(op, error = %e, "Store request failed"),
        }

        outcome
    }

    async fn rows<T: DeserializeOwned>(&self, op: &'static str, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| AppError::Serialization {
            message: format!("Failed to parse {} response: {}", op, e),
        })
    }
}

#[async_trait]
impl ProjectStore for SupabaseStore {
    async fn select(&self, query: ProjectQuery) -> Result<Vec<Project>> {
        let mut params: Vec<(&str, String)> = vec![("select", "*".to_string())];
        match query {
            ProjectQuery::All => {
                params.push(("order", "created_at.desc".to_string()));
            }
            ProjectQuery::Featured => {
                params.push(("featured", "eq.true".to_string()));
                params.push(("order", "created_at.desc".to_string()));
            }
            ProjectQuery::ById(id) => {
                params.push(("id", format!("eq.{}", id)));
            }
        }

        let request = self.request(Method::GET, &self.table_url()).query(&params);
        let response = self.send(query.as_str(), request).await?;
        self.rows(query.as_str(), response).await
    }

    async fn insert(&self, project: &NewProject) -> Result<Project> {
        let request = self
            .request(Method::POST, &self.table_url())
            .header("Prefer", "return=representation")
            .json(project);

        let response = self.send("insert", request).await?;
        let rows: Vec<Project> = self.rows("insert", response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::store("insert returned no row"))
    }

    async fn insert_batch(&self, projects: &[NewProject]) -> Result<Vec<Project>> {
        let request = self
            .request(Method::POST, &self.table_url())
            .header("Prefer", "return=representation")
            .json(projects);

        let response = self.send("insert_batch", request).await?;
        self.rows("insert_batch", response).await
    }

    async fn update(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>> {
        let request = self
            .request(Method::PATCH, &self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(changes);

        let response = self.send("update", request).await?;
        let rows: Vec<Project> = self.rows("update", response).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: i64) -> Result<Option<Project>> {
        let request = self
            .request(Method::DELETE, &self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");

        let response = self.send("delete", request).await?;
        let rows: Vec<Project> = self.rows("delete", response).await?;
        Ok(rows.into_iter().next())
    }

    async fn count(&self) -> Result<u64> {
        let request = self
            .request(Method::HEAD, &self.table_url())
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");

        let response = self.send("count", request).await?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::store("count response has no Content-Range header"))?;

        parse_content_range_total(range).ok_or_else(|| AppError::Store {
            message: format!("Unparsable Content-Range: {}", range),
            status: None,
        })
    }
}

#[async_trait]
impl BlobStore for SupabaseStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let request = self
            .request(Method::POST, &self.object_url(path))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes);

        self.send("upload", request).await?;
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let request = self
            .request(Method::DELETE, &url)
            .json(&serde_json::json!({ "prefixes": paths }));

        self.send("remove", request).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

/// `0-2/3` or `*/0` → total after the slash
fn parse_content_range_total(range: &str) -> Option<u64> {
    range.rsplit_once('/')?.1.trim().parse().ok()
}
