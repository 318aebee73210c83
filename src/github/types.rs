//! Typed request and response shapes for the endpoints that reshape data.

use serde::{Deserialize, Serialize};

/// Body of `POST /create_issue/{user}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// One simplified entry of `GET /commit_history/{user}/{repo}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
    pub html_url: String,
}

/// The subset of GitHub's commit object the summary is built from
#[derive(Debug, Deserialize)]
pub(crate) struct UpstreamCommit {
    sha: String,
    commit: CommitDetail,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: CommitAuthor,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: String,
    date: String,
}

impl From<UpstreamCommit> for CommitSummary {
    fn from(c: UpstreamCommit) -> Self {
        Self {
            sha: c.sha,
            message: c.commit.message,
            author: c.commit.author.name,
            date: c.commit.author.date,
            html_url: c.html_url,
        }
    }
}

/// GitHub user information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    /// GitHub user ID.
    pub id: u64,

    /// GitHub username.
    pub login: String,

    /// Primary email address (may be null if not public).
    #[serde(default)]
    pub email: Option<String>,

    /// Display name (may be null if not set).
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_summary_from_upstream() {
        let json = r#"{
            "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
            "node_id": "MDY6Q29tbWl0",
            "html_url": "https://github.com/octocat/Hello-World/commit/6dcb09b",
            "commit": {
                "message": "Fix all the bugs",
                "author": {"name": "Monalisa Octocat", "email": "mona@github.com", "date": "2011-04-14T16:00:49Z"},
                "committer": {"name": "Monalisa Octocat", "date": "2011-04-14T16:00:49Z"}
            },
            "author": {"login": "octocat"}
        }"#;

        let upstream: UpstreamCommit = serde_json::from_str(json).unwrap();
        let summary = CommitSummary::from(upstream);

        assert_eq!(
            summary,
            CommitSummary {
                sha: "6dcb09b5b57875f334f61aebed695e2e4193db5e".to_string(),
                message: "Fix all the bugs".to_string(),
                author: "Monalisa Octocat".to_string(),
                date: "2011-04-14T16:00:49Z".to_string(),
                html_url: "https://github.com/octocat/Hello-World/commit/6dcb09b".to_string(),
            }
        );
    }

    #[test]
    fn test_new_issue_body_is_optional() {
        let issue: NewIssue = serde_json::from_str(r#"{"title": "Broken link"}"#).unwrap();
        assert_eq!(issue.title, "Broken link");
        assert!(issue.body.is_none());
    }

    #[test]
    fn test_github_user_deserialization_with_nulls() {
        let json = r#"{"id": 12345678, "login": "octocat", "email": null, "name": null}"#;

        let user: GitHubUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 12345678);
        assert_eq!(user.login, "octocat");
        assert_eq!(user.email, None);
        assert_eq!(user.name, None);
    }
}
