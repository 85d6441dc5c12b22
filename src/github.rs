// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! GitHub REST implementation of the repository source

use crate::source::{ForkSource, Repository, SourceError};
use crate::types::RepositoryIdentity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type returning file contents as raw bytes
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Connection settings for [`GitHubSource`]
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Personal access token; anonymous access is heavily rate limited
    pub token: Option<String>,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: concat!("forknet/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`ForkSource`] backed by the GitHub REST API
pub struct GitHubSource {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubSource {
    /// Build a client with the given settings
    pub fn new(config: &GitHubConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SourceError::Transient(format!("invalid token header: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Transient(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn repo_url(&self, identity: &RepositoryIdentity) -> String {
        repo_url(&self.api_url, identity)
    }

    /// Send a request; `Ok(None)` on 404
    async fn send(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Option<reqwest::Response>, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transient(format!("{what}: {e}")))?;
        let status = response.status();
        debug!(status = %status, "GET {}", what);

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_success() {
            return Ok(Some(response));
        }
        Err(classify_failure(status, response.headers(), what))
    }
}

#[async_trait]
impl ForkSource for GitHubSource {
    async fn get_repository(&self, full_name: &str) -> Result<Repository, SourceError> {
        let identity = RepositoryIdentity::parse(full_name)
            .map_err(|_| SourceError::NotFound(full_name.to_string()))?;
        let url = self.repo_url(&identity);
        let response = self
            .send(self.client.get(&url), full_name)
            .await?
            .ok_or_else(|| SourceError::NotFound(full_name.to_string()))?;
        let api: ApiRepository = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("{full_name}: {e}")))?;
        Ok(api.into())
    }

    async fn list_forks(
        &self,
        repo: &Repository,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Repository>, SourceError> {
        let url = format!("{}/forks", self.repo_url(&repo.identity));
        let what = format!("forks of {}", repo.full_name());
        let request = self.client.get(&url).query(&[
            ("sort", "oldest".to_string()),
            ("per_page", per_page.clamp(1, 100).to_string()),
            ("page", page.max(1).to_string()),
        ]);
        let Some(response) = self.send(request, &what).await? else {
            return Err(SourceError::NotFound(repo.full_name()));
        };
        let forks: Vec<ApiRepository> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("{what}: {e}")))?;
        Ok(forks.into_iter().map(Repository::from).collect())
    }

    async fn get_file_content(
        &self,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        let url = format!("{}/contents/{}", self.repo_url(&repo.identity), path);
        let what = format!("{path} in {}", repo.full_name());
        let request = self.client.get(&url).header(ACCEPT, RAW_MEDIA_TYPE);
        match self.send(request, &what).await? {
            Some(response) => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| SourceError::Transient(format!("{what}: {e}")))?;
                Ok(Some(bytes.to_vec()))
            }
            None => Ok(None),
        }
    }
}

fn repo_url(api_url: &str, identity: &RepositoryIdentity) -> String {
    format!("{}/repos/{}/{}", api_url, identity.owner, identity.name)
}

/// Map a non-success, non-404 response onto the adapter's error taxonomy
fn classify_failure(status: StatusCode, headers: &HeaderMap, what: &str) -> SourceError {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && (header_u64("x-ratelimit-remaining") == Some(0)
                || headers.contains_key(RETRY_AFTER)));

    if limited {
        let retry_after = header_u64(RETRY_AFTER.as_str()).or_else(|| {
            header_u64("x-ratelimit-reset").map(|reset| {
                let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
                reset.saturating_sub(now)
            })
        });
        return SourceError::RateLimited { retry_after };
    }

    SourceError::Transient(format!("{what}: HTTP {status}"))
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiParent {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    owner: ApiOwner,
    html_url: String,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    parent: Option<ApiParent>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<ApiRepository> for Repository {
    fn from(api: ApiRepository) -> Self {
        Self {
            identity: RepositoryIdentity::new(api.owner.login, api.name),
            html_url: api.html_url,
            fork: api.fork,
            parent: api.parent.map(|p| p.full_name),
            created_at: api.created_at,
            updated_at: api.updated_at,
        }
    }
}
