//! The generic project API the translation layer is built on.
//!
//! [`ProjectApi`] is the seam between protocol synthesis and the wire:
//! [`crate::GitLabClient`] implements it over HTTPS, tests implement it in
//! memory.

use async_trait::async_trait;
use bytes::Bytes;
use modpox_upstream::UpstreamError;
use serde::Deserialize;

/// A project as returned by the project listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(rename = "path_with_namespace")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: Commit,
}

/// Project repository operations needed to serve the module proxy protocol.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Lists every project visible to the token.
    async fn projects(&self) -> Result<Vec<Project>, UpstreamError>;

    /// Lists every tag of a project.
    async fn tags(&self, project_id: u64) -> Result<Vec<Tag>, UpstreamError>;

    /// Lists commits of the default branch.
    async fn commits(&self, project_id: u64) -> Result<Vec<Commit>, UpstreamError>;

    /// Fetches a single commit by sha, short sha, branch or tag.
    async fn commit(&self, project_id: u64, git_ref: &str) -> Result<Commit, UpstreamError>;

    /// Fetches the decoded content of a file at `git_ref`.
    async fn file(
        &self,
        project_id: u64,
        file_path: &str,
        git_ref: &str,
    ) -> Result<Bytes, UpstreamError>;

    /// Fetches the zip source archive of the tree at `git_ref`.
    async fn archive(&self, project_id: u64, git_ref: &str) -> Result<Bytes, UpstreamError>;
}

/// Resolves a `namespace/project` path to its id with a linear scan of the
/// full listing. Nothing is cached between calls.
pub async fn find_project_id(api: &dyn ProjectApi, path: &str) -> Result<u64, UpstreamError> {
    api.projects()
        .await?
        .into_iter()
        .find(|project| project.path == path)
        .map(|project| project.id)
        .ok_or_else(|| UpstreamError::ProjectNotFound {
            path: path.to_string(),
        })
}
