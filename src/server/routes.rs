use axum::{
    Json,
    extract::{
        FromRequestParts, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::convert::Infallible;

use crate::github::{CommitSummary, GitHubClient, NewIssue, parse_properties};
use crate::oauth::{AccessToken, DeviceCodeResponse, DevicePoll, generate_state};
use crate::server::AppState;
use crate::session::DEFAULT_SESSION;
use crate::vector::ScoredMatch;
use crate::{Error, Result};

pub const SESSION_HEADER: &str = "x-session-id";

/// Session the request acts for, from `X-Session-Id` or the default one
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_SESSION);
        Ok(SessionId(id.to_string()))
    }
}

fn host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

/// GitHub client bound to the session's token, or `AuthMissing`
async fn authed(state: &AppState, session: &SessionId) -> Result<GitHubClient> {
    let token = state.tokens.check_access_token(&session.0).await?;
    Ok(state.github.client(token))
}

/// Record the token and, best effort, the login it belongs to
async fn store_token(state: &AppState, session: &str, token: &AccessToken) -> Result<()> {
    state.tokens.set_access_token(session, &token.access_token).await?;

    match state.github.client(token.access_token.as_str()).get_authenticated_user().await {
        Ok(user) => {
            state.tokens.set_login(session, &user.login).await?;
            tracing::info!("Session {} authenticated as {}", session, user.login);
        }
        Err(e) => tracing::warn!("Could not fetch user for session {}: {}", session, e),
    }
    Ok(())
}

/// Body rejections surface only once the session is known to be authorized
fn bad_body(rejection: JsonRejection) -> Error {
    Error::BadRequest(rejection.body_text())
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

pub async fn generate_auth_url(
    State(state): State<AppState>,
    session: SessionId,
    headers: HeaderMap,
) -> Result<Json<AuthUrlResponse>> {
    let redirect_uri = state.oauth.redirect_uri(host(&headers))?;
    let nonce = generate_state()?;
    state.tokens.set_state(&session.0, &nonce).await?;

    let auth_url = state.oauth.authorize_url(&nonce, &redirect_uri)?;
    tracing::info!("Issued OAuth state for session {}", session.0);
    Ok(Json(AuthUrlResponse { auth_url }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<&'static str> {
    let received = params.state.ok_or(Error::InvalidState)?;
    // A nonce is single use, so only consume it for a complete callback
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::BadRequest("missing code parameter".to_string()))?;
    let session = state.tokens.verify_state(&received).await?;

    let redirect_uri = state.oauth.redirect_uri(host(&headers))?;

    let token = state.oauth.exchange_code(&code, &received, &redirect_uri).await?;
    store_token(&state, &session, &token).await?;

    Ok("OK")
}

pub async fn device_start(State(state): State<AppState>) -> Result<Json<DeviceCodeResponse>> {
    let response = state.oauth.start_device_flow().await?;
    tracing::info!("Started device flow; user code {}", response.user_code);
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct DevicePollRequest {
    pub device_code: String,
}

pub async fn device_poll(
    State(state): State<AppState>,
    session: SessionId,
    Json(request): Json<DevicePollRequest>,
) -> Result<Json<Value>> {
    match state.oauth.poll_device_flow(&request.device_code).await? {
        DevicePoll::Pending { slow_down } => Ok(Json(json!({"status": "pending", "slow_down": slow_down}))),
        DevicePoll::Authorized(token) => {
            store_token(&state, &session.0, &token).await?;
            Ok(Json(json!({"status": "authorized"})))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RepoInfoParams {
    pub properties: Option<String>,
}

pub async fn repository_info(
    State(state): State<AppState>,
    session: SessionId,
    Path((user, repo)): Path<(String, String)>,
    Query(params): Query<RepoInfoParams>,
) -> Result<Json<Value>> {
    let client = authed(&state, &session).await?;
    let properties = params.properties.as_deref().map(parse_properties);

    let info = client
        .get_repository_info(&user, &repo, properties.as_deref())
        .await?;
    Ok(Json(info))
}

pub async fn list_repository_root(
    State(state): State<AppState>,
    session: SessionId,
    Path((user, repo)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let client = authed(&state, &session).await?;
    Ok(Json(client.list_repository_directory(&user, &repo, "").await?))
}

pub async fn list_repository_directory(
    State(state): State<AppState>,
    session: SessionId,
    Path((user, repo, path)): Path<(String, String, String)>,
) -> Result<Json<Value>> {
    let client = authed(&state, &session).await?;
    Ok(Json(client.list_repository_directory(&user, &repo, &path).await?))
}

pub async fn repository_file_contents(
    State(state): State<AppState>,
    session: SessionId,
    Path((user, repo, path)): Path<(String, String, String)>,
) -> Result<Json<Value>> {
    let client = authed(&state, &session).await?;
    let file_info = client.get_repository_file_contents(&user, &repo, &path).await?;

    if let Some(indexer) = &state.indexer {
        match indexer.index_file(&user, &repo, &path, &file_info).await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Indexed {} entities from {}/{}/{}", n, user, repo, path),
            Err(e) => tracing::warn!("Indexing {}/{}/{} failed: {}", user, repo, path, e),
        }
    }

    Ok(Json(file_info))
}

pub async fn create_issue(
    State(state): State<AppState>,
    session: SessionId,
    Path((user, repo)): Path<(String, String)>,
    issue: std::result::Result<Json<NewIssue>, JsonRejection>,
) -> Result<Json<Value>> {
    let client = authed(&state, &session).await?;
    let Json(issue) = issue.map_err(bad_body)?;
    Ok(Json(client.create_issue(&user, &repo, &issue).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub repo_name: Option<String>,
}

pub async fn search_code(
    State(state): State<AppState>,
    session: SessionId,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>> {
    let client = authed(&state, &session).await?;
    let Query(params) = params.map_err(|r| Error::BadRequest(r.body_text()))?;
    Ok(Json(
        client
            .search_code(&params.query, params.repo_name.as_deref())
            .await?,
    ))
}

pub async fn commit_history(
    State(state): State<AppState>,
    session: SessionId,
    Path((user, repo)): Path<(String, String)>,
) -> Result<Json<Vec<CommitSummary>>> {
    let client = authed(&state, &session).await?;
    Ok(Json(client.get_commit_history(&user, &repo).await?))
}

fn default_top_k() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct SimilarCodeRequest {
    pub code_snippet: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

pub async fn query_similar_code(
    State(state): State<AppState>,
    session: SessionId,
    request: std::result::Result<Json<SimilarCodeRequest>, JsonRejection>,
) -> Result<Json<Vec<ScoredMatch>>> {
    state.tokens.check_access_token(&session.0).await?;
    let Json(request) = request.map_err(bad_body)?;

    let indexer = state.indexer.as_ref().ok_or(Error::EmbeddingsDisabled)?;
    if request.top_k == 0 {
        return Err(Error::BadRequest("top_k must be positive".to_string()));
    }

    Ok(Json(indexer.query_similar(&request.code_snippet, request.top_k).await?))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn session_of(request: Request<()>) -> String {
        let (mut parts, _) = request.into_parts();
        let SessionId(id) = SessionId::from_request_parts(&mut parts, &()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_session_id_from_header() {
        let request = Request::builder().header("X-Session-Id", "alice").body(()).unwrap();
        assert_eq!(session_of(request).await, "alice");
    }

    #[tokio::test]
    async fn test_session_id_defaults() {
        assert_eq!(session_of(Request::builder().body(()).unwrap()).await, DEFAULT_SESSION);

        let blank = Request::builder().header("X-Session-Id", "  ").body(()).unwrap();
        assert_eq!(session_of(blank).await, DEFAULT_SESSION);
    }

    #[test]
    fn test_similar_code_request_default_top_k() {
        let request: SimilarCodeRequest = serde_json::from_str(r#"{"code_snippet": "def f(): pass"}"#).unwrap();
        assert_eq!(request.top_k, 10);
    }
}
