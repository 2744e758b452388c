//! PR comment posting for GitHub and Azure DevOps.
//!
//! Comment posting failures never change the verdict or the exit code;
//! callers log the error and move on.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::platform::{Platform, PlatformContext};

const COMMENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("missing environment variable(s): {0}")]
    MissingEnv(String),

    #[error("invalid GitHub PR URL: {0}")]
    InvalidPrUrl(String),

    #[error("cannot determine GitHub PR target; set GITHUB_REPOSITORY and GITHUB_REF or pass --pr-url")]
    NoGithubTarget,

    #[error("Azure DevOps comments require an Azure Repos Git repository, found provider {0}")]
    UnsupportedRepoProvider(String),

    #[error("SYSTEM_COLLECTIONURI must use https, got {0}")]
    InsecureCollectionUri(String),

    #[error("comment API returned {status}: {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("comment request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Post the markdown to the PR of the detected platform.
pub async fn post_comment(
    ctx: &PlatformContext,
    markdown: &str,
    pr_url: Option<&str>,
) -> Result<(), CommentError> {
    match ctx.platform {
        Some(Platform::GitHub) => post_github_comment(markdown, pr_url).await,
        Some(Platform::AzureDevOps) => post_azdevops_comment(markdown).await,
        _ => {
            // A --pr-url still lets a local run target a GitHub PR.
            if pr_url.is_some() {
                post_github_comment(markdown, pr_url).await
            } else {
                Err(CommentError::NoGithubTarget)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
struct GithubTarget {
    owner: String,
    repo: String,
    pr_number: String,
}

async fn post_github_comment(markdown: &str, pr_url: Option<&str>) -> Result<(), CommentError> {
    let token = std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CommentError::MissingEnv("GITHUB_TOKEN".to_string()))?;

    let target = match pr_url {
        Some(url) => parse_pr_url(url)?,
        None => github_target_from_env(
            std::env::var("GITHUB_REPOSITORY").ok().as_deref(),
            std::env::var("GITHUB_REF").ok().as_deref(),
        )?,
    };

    let url = format!(
        "https://api.github.com/repos/{}/{}/issues/{}/comments",
        target.owner, target.repo, target.pr_number
    );
    let response = client()?
        .post(&url)
        .bearer_auth(token)
        .header("Accept", "application/vnd.github.v3+json")
        .header("User-Agent", concat!("driftgate/", env!("CARGO_PKG_VERSION")))
        .json(&json!({ "body": markdown }))
        .send()
        .await?;

    check_status(response).await
}

/// Parse `https://github.com/{owner}/{repo}/pull/{number}`.
fn parse_pr_url(url: &str) -> Result<GithubTarget, CommentError> {
    let invalid = || CommentError::InvalidPrUrl(url.to_string());
    let rest = url.split_once("github.com/").ok_or_else(invalid)?.1;
    let mut parts = rest.split('/');
    let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    match parts.next() {
        Some("pull") => {}
        _ => return Err(invalid()),
    }
    let number = parts
        .next()
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(invalid)?;
    Ok(GithubTarget {
        owner: owner.to_string(),
        repo: repo.to_string(),
        pr_number: number.to_string(),
    })
}

/// Derive the PR target from `GITHUB_REPOSITORY` (owner/repo) and
/// `GITHUB_REF` (refs/pull/{number}/merge).
fn github_target_from_env(
    repository: Option<&str>,
    github_ref: Option<&str>,
) -> Result<GithubTarget, CommentError> {
    let repository = repository.ok_or(CommentError::NoGithubTarget)?;
    let (owner, repo) = repository
        .split_once('/')
        .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
        .ok_or(CommentError::NoGithubTarget)?;

    let github_ref = github_ref.ok_or(CommentError::NoGithubTarget)?;
    let number = github_ref
        .strip_prefix("refs/pull/")
        .and_then(|rest| rest.split('/').next())
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .ok_or(CommentError::NoGithubTarget)?;

    Ok(GithubTarget {
        owner: owner.to_string(),
        repo: repo.to_string(),
        pr_number: number.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Azure DevOps
// ---------------------------------------------------------------------------

async fn post_azdevops_comment(markdown: &str) -> Result<(), CommentError> {
    // Thread creation only works against Azure Repos Git; GitHub repos
    // built on Azure Pipelines must use GITHUB_TOKEN instead.
    let provider =
        std::env::var("BUILD_REPOSITORY_PROVIDER").unwrap_or_else(|_| "TfsGit".to_string());
    if provider != "TfsGit" {
        return Err(CommentError::UnsupportedRepoProvider(provider));
    }

    let mut missing = Vec::new();
    let mut require = |name: &'static str| {
        let value = std::env::var(name).ok().filter(|v| !v.is_empty());
        if value.is_none() {
            missing.push(name);
        }
        value
    };
    let token = require("SYSTEM_ACCESSTOKEN");
    let collection_uri = require("SYSTEM_COLLECTIONURI");
    let project = require("SYSTEM_TEAMPROJECT");
    let pr_id = require("SYSTEM_PULLREQUEST_PULLREQUESTID");
    let repo_id = require("BUILD_REPOSITORY_ID");
    let (token, collection_uri, project, pr_id, repo_id) =
        match (token, collection_uri, project, pr_id, repo_id) {
            (Some(t), Some(c), Some(p), Some(id), Some(r)) => (t, c, p, id, r),
            _ => return Err(CommentError::MissingEnv(missing.join(", "))),
        };

    if !collection_uri.starts_with("https://") {
        return Err(CommentError::InsecureCollectionUri(collection_uri));
    }

    let url = format!(
        "{}/{}/_apis/git/repositories/{}/pullRequests/{}/threads?api-version=7.0",
        collection_uri.trim_end_matches('/'),
        project,
        repo_id,
        pr_id
    );
    let payload = json!({
        "comments": [{
            "parentCommentId": 0,
            "content": markdown,
            "commentType": 1,
        }],
        "status": 1,
    });

    let response = client()?
        .post(&url)
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?;

    check_status(response).await
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

fn client() -> Result<Client, CommentError> {
    Ok(Client::builder().timeout(COMMENT_TIMEOUT).build()?)
}

async fn check_status(response: reqwest::Response) -> Result<(), CommentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let detail = response.text().await.unwrap_or_default();
    let detail = detail.chars().take(300).collect::<String>();
    Err(CommentError::Status { status, detail })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_github_pr_url() {
        let target = parse_pr_url("https://github.com/acme/infra/pull/123").unwrap();
        assert_eq!(
            target,
            GithubTarget {
                owner: "acme".to_string(),
                repo: "infra".to_string(),
                pr_number: "123".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_non_pull_url() {
        assert!(parse_pr_url("https://github.com/acme/infra/issues/5").is_err());
        assert!(parse_pr_url("https://example.com/acme/infra/pull/5").is_err());
        assert!(parse_pr_url("https://github.com/acme/infra/pull/abc").is_err());
    }

    #[test]
    fn test_github_target_from_ref() {
        let target =
            github_target_from_env(Some("acme/infra"), Some("refs/pull/77/merge")).unwrap();
        assert_eq!(target.pr_number, "77");
        assert_eq!(target.owner, "acme");
    }

    #[test]
    fn test_github_target_requires_pull_ref() {
        assert!(github_target_from_env(Some("acme/infra"), Some("refs/heads/main")).is_err());
        assert!(github_target_from_env(None, Some("refs/pull/77/merge")).is_err());
        assert!(github_target_from_env(Some("malformed"), Some("refs/pull/77/merge")).is_err());
    }
}
