//! GitHub API client for repository operations.

use super::types::{CommitSummary, GitHubUser, NewIssue, UpstreamCommit};
use crate::config::GitHubConfig;
use crate::{Error, Result};
use reqwest::{Method, RequestBuilder};
use serde_json::{Map, Value};
use url::Url;

const API_VERSION: &str = "2022-11-28";

/// Shared HTTP client and base URL for the GitHub REST API.
///
/// Holds no credentials; call [`GitHubApi::client`] with a user's token to
/// get a [`GitHubClient`] for one request.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubApi {
    pub fn new(http: reqwest::Client, config: &GitHubConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Bind a token for authenticated calls
    pub fn client(&self, token: impl Into<String>) -> GitHubClient {
        GitHubClient {
            api: self.clone(),
            token: token.into(),
        }
    }
}

/// Stateless per-request wrapper over the GitHub REST API.
///
/// Response bodies are returned verbatim, upstream error payloads included;
/// no retries, pagination or rate-limit handling.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api: GitHubApi,
    token: String,
}

impl GitHubClient {
    /// Request to the endpoint built from `segments`, each percent-encoded
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = api_url(&self.api.api_base, segments)?;
        Ok(self
            .api
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    async fn send_json(&self, builder: RequestBuilder) -> Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status.is_success() {
            tracing::debug!("GitHub {} -> {}", url, status);
        } else {
            tracing::warn!("GitHub {} -> {} (passing body through)", url, status);
        }

        Ok(response.json::<Value>().await?)
    }

    /// `GET /repos/{owner}/{repo}`, optionally keeping only `properties`
    pub async fn get_repository_info(
        &self,
        owner: &str,
        repo: &str,
        properties: Option<&[String]>,
    ) -> Result<Value> {
        let info = self
            .send_json(self.request(Method::GET, &["repos", owner, repo])?)
            .await?;

        Ok(match properties {
            Some(props) if !props.is_empty() => filter_properties(info, props),
            _ => info,
        })
    }

    /// `GET /repos/{owner}/{repo}/contents/{path}`; an empty path lists the root
    pub async fn list_repository_directory(&self, owner: &str, repo: &str, path: &str) -> Result<Value> {
        self.send_json(self.request(Method::GET, &contents_segments(owner, repo, path))?)
            .await
    }

    /// `GET /repos/{owner}/{repo}/contents/{path}` for a single file
    pub async fn get_repository_file_contents(&self, owner: &str, repo: &str, path: &str) -> Result<Value> {
        self.send_json(self.request(Method::GET, &contents_segments(owner, repo, path))?)
            .await
    }

    /// `POST /repos/{owner}/{repo}/issues`
    pub async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<Value> {
        let builder = self
            .request(Method::POST, &["repos", owner, repo, "issues"])?
            .json(issue);
        self.send_json(builder).await
    }

    /// `GET /search/code?q=...`, scoped to `repo` when given
    pub async fn search_code(&self, query: &str, repo: Option<&str>) -> Result<Value> {
        let q = search_query(query, repo);
        let builder = self.request(Method::GET, &["search", "code"])?.query(&[("q", q.as_str())]);
        self.send_json(builder).await
    }

    /// `GET /repos/{owner}/{repo}/commits`, simplified per commit
    pub async fn get_commit_history(&self, owner: &str, repo: &str) -> Result<Vec<CommitSummary>> {
        let commits = self
            .send_json(self.request(Method::GET, &["repos", owner, repo, "commits"])?)
            .await?;
        summarize_commits(commits)
    }

    /// `GET /user`
    pub async fn get_authenticated_user(&self) -> Result<GitHubUser> {
        let response = self.request(Method::GET, &["user"])?.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::AuthMissing);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::UnexpectedPayload(format!(
                "failed to get user info: {} - {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Segments of a contents endpoint; empty path components are dropped
fn contents_segments<'a>(owner: &'a str, repo: &'a str, path: &'a str) -> Vec<&'a str> {
    let mut segments = vec!["repos", owner, repo, "contents"];
    segments.extend(path.split('/').filter(|s| !s.is_empty()));
    segments
}

/// Append `segments` to the API base, percent-encoding each one.
///
/// Empty, `.` and `..` segments are rejected so a caller-supplied name can
/// never address a different endpoint.
pub fn api_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::Config(format!("invalid GitHub API base {}: {}", base, e)))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("GitHub API base {} cannot take a path", base)))?;
        path.pop_if_empty();
        for segment in segments {
            if matches!(*segment, "" | "." | "..") {
                return Err(Error::BadRequest(format!("invalid path segment {:?}", segment)));
            }
            path.push(segment);
        }
    }
    Ok(url)
}

/// Keep only the requested top-level keys; non-objects pass through
pub fn filter_properties(value: Value, properties: &[String]) -> Value {
    match value {
        Value::Object(map) => {
            let filtered: Map<String, Value> = map
                .into_iter()
                .filter(|(k, _)| properties.iter().any(|p| p == k))
                .collect();
            Value::Object(filtered)
        }
        other => other,
    }
}

/// Split the `properties=a,b,c` query parameter
pub fn parse_properties(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn search_query(query: &str, repo: Option<&str>) -> String {
    match repo.filter(|r| !r.is_empty()) {
        Some(repo) => format!("{} repo:{}", query, repo),
        None => query.to_string(),
    }
}

/// Convert the upstream commit list into summaries
pub fn summarize_commits(value: Value) -> Result<Vec<CommitSummary>> {
    if !value.is_array() {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("expected a list of commits");
        return Err(Error::UnexpectedPayload(message.to_string()));
    }

    let commits: Vec<UpstreamCommit> = serde_json::from_value(value)?;
    Ok(commits.into_iter().map(CommitSummary::from).collect())
}
