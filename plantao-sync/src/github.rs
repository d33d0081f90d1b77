//! Revisioned blob client for a GitHub-style repository contents API.
//!
//! The store file lives at one locator (`owner/repo/path@branch`). Every
//! byte version the host holds is identified by an opaque revision token
//! (the content `sha`); updates are conditional on the writer's last known
//! token, which is the only concurrency control the protocol has.

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth;
use crate::error::{SyncError, SyncResult};

/// Configuration for the blob host client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Path of the store file inside the repository.
    pub path_in_repo: String,
    /// Branch holding the file.
    pub branch: String,
    /// Base URL of the API (e.g. `https://api.github.com`).
    pub api_base_url: String,
    /// Explicit bearer credential; when absent, the secrets file and the
    /// environment are consulted (see [`auth::resolve_token`]).
    pub token: Option<String>,
    /// Overall timeout applied to every request, in seconds.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            path_in_repo: "data/plantao.db".to_string(),
            branch: "main".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            token: None,
            timeout_secs: 60,
        }
    }
}

/// The remote file's current content and revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub bytes: Vec<u8>,
    pub revision: String,
}

/// Outcome of one publish attempt. Transport failures are `Err` at the call
/// site; these three are answers from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publish {
    /// The host accepted the write and minted a new revision.
    Published { revision: String, status: u16 },
    /// The precondition failed: the token is stale, or a create hit
    /// existing content.
    Conflict { status: u16, detail: String },
    /// Host-side validation refused the payload. `detail` carries the
    /// host's diagnostic body verbatim.
    Rejected { status: u16, detail: String },
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: Option<PutContent>,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutPayload<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Client for one locator on the blob host. No local state: every method is
/// a remote call and nothing here mutates the store.
pub struct GitHubClient {
    config: GitHubConfig,
    client: Client,
    token: Option<String>,
}

impl GitHubClient {
    /// Creates a client, resolving the bearer credential once up front.
    #[must_use]
    pub fn new(config: GitHubConfig) -> Self {
        let client = Client::builder()
            .user_agent("plantao-sync/0.4")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");
        let token = auth::resolve_token(config.token.as_deref());
        Self {
            config,
            client,
            token,
        }
    }

    /// True when requests will carry a bearer credential.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url, self.config.owner, self.config.repo, self.config.path_in_repo
        )
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Downloads the file's current content and revision. `Ok(None)` is the
    /// clean bootstrap signal: nothing published at this locator yet.
    pub async fn fetch(&self) -> SyncResult<Option<RemoteSnapshot>> {
        let response = self
            .request(self.client.get(self.contents_url()))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("fetch failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("remote has no content at this locator");
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!(
                "fetch failed (status {status}): {body}"
            )));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Transport(format!("failed to parse fetch response: {e}")))?;

        let encoded = contents
            .content
            .ok_or_else(|| SyncError::Transport("fetch response missing content".to_string()))?;
        let revision = contents
            .sha
            .ok_or_else(|| SyncError::Transport("fetch response missing revision".to_string()))?;

        // The host wraps base64 bodies in newlines.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| SyncError::Transport(format!("invalid base64 in fetch response: {e}")))?;

        debug!(bytes = bytes.len(), revision = %revision, "remote content fetched");
        Ok(Some(RemoteSnapshot { bytes, revision }))
    }

    /// [`GitHubClient::fetch`], writing the bytes to `dest` and returning
    /// just the revision.
    pub async fn fetch_to_file(&self, dest: &Path) -> SyncResult<Option<String>> {
        match self.fetch().await? {
            Some(snapshot) => {
                tokio::fs::write(dest, &snapshot.bytes).await?;
                Ok(Some(snapshot.revision))
            }
            None => Ok(None),
        }
    }

    /// Publishes `bytes` at the locator.
    ///
    /// With a revision token this is a conditional update: the host accepts
    /// only while its current revision still matches, answering 409
    /// otherwise. Without a token it is an unconditional create, which the
    /// host refuses (also 409) when content already exists. An empty payload
    /// is refused here, before any network traffic.
    pub async fn publish(
        &self,
        bytes: &[u8],
        revision: Option<&str>,
        message: &str,
    ) -> SyncResult<Publish> {
        if bytes.is_empty() {
            return Ok(Publish::Rejected {
                status: 422,
                detail: "local store file is empty (0 bytes)".to_string(),
            });
        }

        let payload = PutPayload {
            message,
            content: STANDARD.encode(bytes),
            branch: &self.config.branch,
            sha: revision,
        };

        let response = self
            .request(self.client.put(self.contents_url()))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("publish failed: {e}")))?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            let body: PutResponse = response.json().await.map_err(|e| {
                SyncError::Transport(format!("failed to parse publish response: {e}"))
            })?;
            let new_revision = body
                .content
                .and_then(|c| c.sha)
                .ok_or_else(|| {
                    SyncError::Transport("publish response missing new revision".to_string())
                })?;
            info!(revision = %new_revision, status, "store published");
            return Ok(Publish::Published {
                revision: new_revision,
                status,
            });
        }

        let detail = response.text().await.unwrap_or_default();
        if status == 409 {
            debug!("publish conflicted: remote moved past our revision");
            Ok(Publish::Conflict { status, detail })
        } else {
            Ok(Publish::Rejected { status, detail })
        }
    }

    /// Metadata-only probe of the current revision, without downloading
    /// content. `Ok(None)` when nothing is published.
    pub async fn current_revision(&self) -> SyncResult<Option<String>> {
        let response = self
            .request(self.client.get(self.contents_url()))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("revision probe failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!(
                "revision probe failed (status {status}): {body}"
            )));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Transport(format!("failed to parse revision probe: {e}")))?;
        Ok(contents.sha)
    }
}
