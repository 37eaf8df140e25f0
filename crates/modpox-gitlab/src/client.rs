//! HTTPS client for the GitLab v4 project API.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use modpox_upstream::UpstreamError;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{Commit, Project, ProjectApi, Tag};
use crate::transport::TokenTransport;

/// Page size requested from list endpoints.
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct FileContent {
    content: String,
}

/// Decodes the base64 `content` of a file API answer. GitLab may wrap the
/// encoded text across lines.
fn decode_content(content: &str) -> Result<Bytes, UpstreamError> {
    let encoded: String = content.split_whitespace().collect();
    let decoded = STANDARD.decode(encoded).map_err(UpstreamError::encoding)?;
    Ok(Bytes::from(decoded))
}

/// Collects `fetch(1), fetch(2), …` until a page shorter than `PER_PAGE`.
async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, UpstreamError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, UpstreamError>>,
{
    let mut items = Vec::new();
    let mut page = 1usize;
    loop {
        let batch = fetch(page).await?;
        let done = batch.len() < PER_PAGE;
        items.extend(batch);
        if done {
            return Ok(items);
        }
        page += 1;
    }
}

pub struct GitLabClient {
    base: Url,
    transport: TokenTransport,
}

impl GitLabClient {
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Result<Self, UpstreamError> {
        let host = host.into();
        let base =
            Url::parse(&format!("https://{host}/api/v4/")).map_err(UpstreamError::encoding)?;
        Ok(Self {
            base,
            transport: TokenTransport::new(host, token, client),
        })
    }

    /// Same API over plain HTTP, for tests against a local mock server.
    #[cfg(test)]
    fn plaintext(host: &str, token: &str, client: Client) -> Result<Self, UpstreamError> {
        let base =
            Url::parse(&format!("http://{host}/api/v4/")).map_err(UpstreamError::encoding)?;
        Ok(Self {
            base,
            transport: TokenTransport::plaintext(host, token, client),
        })
    }

    /// Builds `https://<host>/api/v4/<segments…>` with each segment
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let body = self.transport.get(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_all<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Vec<T>, UpstreamError> {
        collect_pages(|page| {
            let mut url = self.endpoint(segments);
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            self.get_json(url)
        })
        .await
    }
}

#[async_trait]
impl ProjectApi for GitLabClient {
    async fn projects(&self) -> Result<Vec<Project>, UpstreamError> {
        self.get_all(&["projects"]).await
    }

    async fn tags(&self, project_id: u64) -> Result<Vec<Tag>, UpstreamError> {
        let id = project_id.to_string();
        self.get_all(&["projects", &id, "repository", "tags"]).await
    }

    async fn commits(&self, project_id: u64) -> Result<Vec<Commit>, UpstreamError> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "repository", "commits"]);
        self.get_json(url).await
    }

    async fn commit(&self, project_id: u64, git_ref: &str) -> Result<Commit, UpstreamError> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "repository", "commits", git_ref]);
        self.get_json(url).await
    }

    async fn file(
        &self,
        project_id: u64,
        file_path: &str,
        git_ref: &str,
    ) -> Result<Bytes, UpstreamError> {
        let id = project_id.to_string();
        let mut url = self.endpoint(&["projects", &id, "repository", "files", file_path]);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let file: FileContent = self.get_json(url).await?;
        decode_content(&file.content)
    }

    async fn archive(&self, project_id: u64, git_ref: &str) -> Result<Bytes, UpstreamError> {
        let id = project_id.to_string();
        let mut url = self.endpoint(&["projects", &id, "repository", "archive.zip"]);
        url.query_pairs_mut().append_pair("sha", git_ref);
        self.transport.get(url).await
    }
}
