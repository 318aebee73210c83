//! GitHub REST API access
//!
//! [`GitHubApi`] is built once at startup; each request binds the caller's
//! token with [`GitHubApi::client`].

pub mod client;
pub mod types;

pub use client::{GitHubApi, GitHubClient, filter_properties, parse_properties, search_query, summarize_commits};
pub use types::{CommitSummary, GitHubUser, NewIssue};

use crate::Result;
use crate::config::GitHubConfig;
use std::time::Duration;

/// Outbound HTTP client shared by the GitHub, OAuth and Pinecone calls
pub fn build_http_client(config: &GitHubConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
