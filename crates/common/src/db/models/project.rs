//! Project entity and its write payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// A persisted project row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,

    pub title: String,

    pub description: String,

    /// Public image URL, empty when none
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,

    /// Tech tags in display order
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech: Vec<String>,

    #[serde(default)]
    pub github: Option<String>,

    #[serde(default)]
    pub demo: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Insert payload: everything the store does not assign
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewProject {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub tech: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,

    #[serde(default)]
    pub featured: bool,
}

impl NewProject {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_tech<I, S>(mut self, tech: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tech = tech.into_iter().map(Into::into).collect();
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }
}

/// Partial update. Only the fields that are `Some` are sent to the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl ProjectPatch {
    /// Patch that only toggles the featured flag
    pub fn featured(featured: bool) -> Self {
        Self {
            featured: Some(featured),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the provided fields into a row
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(image) = &self.image {
            project.image = image.clone();
        }
        if let Some(tech) = &self.tech {
            project.tech = tech.clone();
        }
        if let Some(github) = &self.github {
            project.github = Some(github.clone());
        }
        if let Some(demo) = &self.demo {
            project.demo = Some(demo.clone());
        }
        if let Some(featured) = self.featured {
            project.featured = featured;
        }
    }
}

/// What an update actually writes: the patch plus the refreshed timestamp
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectChanges {
    #[serde(flatten)]
    pub patch: ProjectPatch,

    pub updated_at: DateTime<Utc>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
