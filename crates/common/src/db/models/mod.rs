//! Entity models
//!
//! Row shapes of the `projects` table and the payloads written to it

mod project;

pub use project::{NewProject, Project, ProjectChanges, ProjectPatch};
