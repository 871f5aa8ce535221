//! # Gateway client
//!
//! Thin typed wrapper over the gateway's HTTP API. Admin calls carry the
//! session token as a bearer credential.

use anyhow::{bail, Context, Result};
use folio_common::config::GatewayConfig;
use folio_common::db::models::{NewProject, Project, ProjectPatch};
use folio_common::db::SeedOutcome;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    fn admin(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, &format!("/v1/admin{}", path))
            .bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.context("gateway unreachable")?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        tracing::debug!(status = status.as_u16(), %message, "Gateway request failed");
        bail!("gateway returned {}: {}", status, message)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .context("unexpected gateway response body")
    }

    // ── Public reads ────────────────────────────────────────────────────

    pub async fn list(&self, featured: bool) -> Result<Vec<Project>> {
        let path = if featured {
            "/v1/projects/featured"
        } else {
            "/v1/projects"
        };
        self.json(self.request(Method::GET, path)).await
    }

    pub async fn get(&self, id: i64) -> Result<Project> {
        self.json(self.request(Method::GET, &format!("/v1/projects/{}", id)))
            .await
    }

    /// Readiness report of the gateway and its store
    pub async fn ready(&self) -> Result<serde_json::Value> {
        let response = self
            .request(Method::GET, "/ready")
            .send()
            .await
            .context("gateway unreachable")?;
        response
            .json()
            .await
            .context("unexpected readiness response body")
    }

    // ── Admin writes ────────────────────────────────────────────────────

    pub async fn create(&self, token: &str, project: &NewProject) -> Result<Project> {
        self.json(self.admin(Method::POST, "/projects", token).json(project))
            .await
    }

    pub async fn update(&self, token: &str, id: i64, patch: &ProjectPatch) -> Result<Project> {
        self.json(
            self.admin(Method::PATCH, &format!("/projects/{}", id), token)
                .json(patch),
        )
        .await
    }

    pub async fn delete(&self, token: &str, id: i64) -> Result<()> {
        self.send(self.admin(Method::DELETE, &format!("/projects/{}", id), token))
            .await?;
        Ok(())
    }

    pub async fn upload_image(
        &self,
        token: &str,
        id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let request = self
            .admin(Method::POST, &format!("/projects/{}/image", id), token)
            .query(&[("file_name", file_name)])
            .body(bytes);
        let uploaded: UploadResponse = self.json(request).await?;
        Ok(uploaded.url)
    }

    pub async fn delete_image(&self, token: &str, url: &str) -> Result<()> {
        self.send(
            self.admin(Method::DELETE, "/images", token)
                .json(&serde_json::json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    pub async fn seed(&self, token: &str) -> Result<SeedOutcome> {
        self.json(self.admin(Method::POST, "/seed", token)).await
    }
}
