//! The private-host translating resolver.

use std::sync::Arc;

use async_trait::async_trait;
use modpox_upstream::{DynUpstream, Fetched, LayerExt, StatusCode, Upstream, UpstreamError};
use serde::Serialize;

use crate::api::{Commit, ProjectApi, find_project_id};
use crate::archive::{module_root, rewrite_archive};
use crate::key::{ModuleRequest, RequestKind, is_private, parse_request};
use crate::pseudo::{commit_pseudo_version, parse_timestamp, resolve_ref};
use crate::semver::sorted_tags;

const LAYER: &str = "gitlab upstream";

/// Body of `@latest` and `.info` responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModInfo<'a> {
    version: &'a str,
    time: &'a str,
}

fn mod_info(version: &str, time: &str) -> Result<Fetched, UpstreamError> {
    let body = serde_json::to_vec(&ModInfo { version, time })?;
    Ok(Fetched::ok(body))
}

/// Picks the newest commit by timestamp. Ties, and commits whose timestamp
/// does not parse, keep the API order.
fn newest_commit(commits: &[Commit]) -> Option<&Commit> {
    commits.iter().reduce(|newest, candidate| {
        match (
            parse_timestamp(&newest.created_at).ok(),
            parse_timestamp(&candidate.created_at).ok(),
        ) {
            (Some(a), Some(b)) if b > a => candidate,
            (None, Some(_)) => candidate,
            _ => newest,
        }
    })
}

/// Answers module proxy requests for one private host from its project API;
/// every other key goes to `upstream`.
pub struct GitLabUpstream {
    host: String,
    api: Arc<dyn ProjectApi>,
    upstream: DynUpstream,
}

impl GitLabUpstream {
    pub fn new(host: impl Into<String>, api: Arc<dyn ProjectApi>, upstream: DynUpstream) -> Self {
        Self {
            host: host.into(),
            api,
            upstream,
        }
    }

    async fn project_id(&self, request: &ModuleRequest) -> Result<u64, UpstreamError> {
        find_project_id(self.api.as_ref(), &request.project).await
    }

    async fn list(&self, request: &ModuleRequest) -> Result<Fetched, UpstreamError> {
        let id = self.project_id(request).await?;
        let tags = self.api.tags(id).await?;

        let mut body = String::new();
        for version in sorted_tags(&tags) {
            body.push_str(&version.raw);
            body.push('\n');
        }
        Ok(Fetched::ok(body))
    }

    async fn latest(&self, request: &ModuleRequest) -> Result<Fetched, UpstreamError> {
        let id = self.project_id(request).await?;
        let tags = self.api.tags(id).await?;

        if tags.is_empty() {
            let commits = self.api.commits(id).await?;
            let commit = newest_commit(&commits).ok_or_else(|| UpstreamError::NoCommits {
                path: request.project.clone(),
            })?;
            let version = commit_pseudo_version(commit)?;
            return mod_info(&version, &commit.created_at);
        }

        let versions = sorted_tags(&tags);
        match versions.iter().filter(|v| v.valid).next_back() {
            Some(latest) => mod_info(&latest.raw, &latest.date),
            None => Ok(Fetched::empty(StatusCode::GONE)),
        }
    }

    async fn info(&self, request: &ModuleRequest, version: &str) -> Result<Fetched, UpstreamError> {
        let id = self.project_id(request).await?;
        let commit = self.api.commit(id, resolve_ref(version)).await?;
        mod_info(version, &commit.created_at)
    }

    async fn module_file(
        &self,
        request: &ModuleRequest,
        version: &str,
    ) -> Result<Fetched, UpstreamError> {
        let id = self.project_id(request).await?;
        let content = self.api.file(id, "go.mod", resolve_ref(version)).await?;
        Ok(Fetched::ok(content))
    }

    async fn zip(
        &self,
        key: &str,
        request: &ModuleRequest,
        version: &str,
    ) -> Result<Fetched, UpstreamError> {
        let root = module_root(key)?;
        let id = self.project_id(request).await?;
        let raw = self.api.archive(id, resolve_ref(version)).await?;
        let rewritten = rewrite_archive(&raw, &root)?;
        Ok(Fetched::ok(rewritten))
    }

    async fn translate(&self, key: &str) -> Result<Fetched, UpstreamError> {
        let request = parse_request(key)?;
        match &request.kind {
            RequestKind::List => self.list(&request).await,
            RequestKind::Latest => self.latest(&request).await,
            RequestKind::Zip(version) => self.zip(key, &request, version).await,
            RequestKind::Info(version) => self.info(&request, version).await,
            RequestKind::Mod(version) => self.module_file(&request, version).await,
            RequestKind::Unsupported => Ok(Fetched::empty(StatusCode::FORBIDDEN)),
        }
    }
}

#[async_trait]
impl Upstream for GitLabUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        if !is_private(&self.host, key) {
            return self.upstream.get(key).await;
        }
        tracing::info!(host = %self.host, key = %key, "query private gitlab");
        self.translate(key).await.layer(LAYER)
    }
}
