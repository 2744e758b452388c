//! CI platform detection for GitHub Actions and Azure DevOps.
//!
//! Detected PR metadata fills in unset CLI flags; the detected base
//! branch adjusts the default diff reference. Azure DevOps does not
//! expose PR title/description in environment variables, so those stay
//! unset unless provided via flags.

use serde_json::Value;
use tracing::warn;

/// Detected CI platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    GitHub,
    AzureDevOps,
    Local,
}

impl Platform {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub Actions",
            Self::AzureDevOps => "Azure DevOps",
            Self::Local => "local",
        }
    }
}

/// Unified CI platform context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformContext {
    pub platform: Option<Platform>,
    pub pr_number: Option<String>,
    pub pr_title: Option<String>,
    pub pr_description: Option<String>,
    pub base_branch: Option<String>,
    pub source_branch: Option<String>,
    pub repository: Option<String>,
}

impl PlatformContext {
    pub fn is_ci(&self) -> bool {
        matches!(self.platform, Some(Platform::GitHub | Platform::AzureDevOps))
    }
}

/// Auto-detect the CI platform from the process environment.
pub fn detect_platform() -> PlatformContext {
    detect_with(|name| std::env::var(name).ok())
}

/// Detection against an injectable environment, for testing.
pub fn detect_with<F>(env: F) -> PlatformContext
where
    F: Fn(&str) -> Option<String>,
{
    if env("GITHUB_ACTIONS").as_deref() == Some("true") {
        return detect_github(env);
    }
    if env("TF_BUILD").as_deref() == Some("True") || env("AGENT_ID").is_some() {
        return detect_azuredevops(env);
    }
    PlatformContext {
        platform: Some(Platform::Local),
        ..PlatformContext::default()
    }
}

fn detect_github<F>(env: F) -> PlatformContext
where
    F: Fn(&str) -> Option<String>,
{
    let mut ctx = PlatformContext {
        platform: Some(Platform::GitHub),
        repository: env("GITHUB_REPOSITORY"),
        base_branch: env("GITHUB_BASE_REF").filter(|s| !s.is_empty()),
        source_branch: env("GITHUB_HEAD_REF").filter(|s| !s.is_empty()),
        ..PlatformContext::default()
    };

    let event_name = env("GITHUB_EVENT_NAME");
    if matches!(
        event_name.as_deref(),
        Some("pull_request") | Some("pull_request_target")
    ) {
        if let Some(path) = env("GITHUB_EVENT_PATH") {
            match std::fs::read_to_string(&path) {
                Ok(text) => apply_github_event(&mut ctx, &text),
                Err(e) => warn!(path = %path, "could not read GitHub event file: {e}"),
            }
        }
    }
    ctx
}

/// Pull PR number/title/body out of a GitHub event payload.
fn apply_github_event(ctx: &mut PlatformContext, text: &str) {
    let event: Value = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("could not parse GitHub event file: {e}");
            return;
        }
    };
    let pr = &event["pull_request"];
    if let Some(number) = pr["number"].as_u64() {
        ctx.pr_number = Some(number.to_string());
    }
    ctx.pr_title = pr["title"].as_str().map(str::to_string);
    ctx.pr_description = pr["body"].as_str().map(str::to_string);
}

fn detect_azuredevops<F>(env: F) -> PlatformContext
where
    F: Fn(&str) -> Option<String>,
{
    PlatformContext {
        platform: Some(Platform::AzureDevOps),
        pr_number: env("SYSTEM_PULLREQUEST_PULLREQUESTID"),
        base_branch: env("SYSTEM_PULLREQUEST_TARGETBRANCH"),
        source_branch: env("SYSTEM_PULLREQUEST_SOURCEBRANCH"),
        repository: env("BUILD_REPOSITORY_NAME"),
        ..PlatformContext::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_local_when_no_ci_markers() {
        let ctx = detect_with(env_of(&[]));
        assert_eq!(ctx.platform, Some(Platform::Local));
        assert!(!ctx.is_ci());
    }

    #[test]
    fn test_detects_github_branches() {
        let ctx = detect_with(env_of(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_REPOSITORY", "acme/infra"),
            ("GITHUB_BASE_REF", "main"),
            ("GITHUB_HEAD_REF", "feature/storage"),
        ]));
        assert_eq!(ctx.platform, Some(Platform::GitHub));
        assert_eq!(ctx.repository.as_deref(), Some("acme/infra"));
        assert_eq!(ctx.base_branch.as_deref(), Some("main"));
        assert!(ctx.is_ci());
    }

    #[test]
    fn test_github_event_file_fills_pr_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(
            &path,
            r#"{"pull_request": {"number": 42, "title": "Add cache", "body": "Adds a redis cache"}}"#,
        )
        .unwrap();

        let ctx = detect_with(env_of(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_EVENT_PATH", path.to_str().unwrap()),
        ]));
        assert_eq!(ctx.pr_number.as_deref(), Some("42"));
        assert_eq!(ctx.pr_title.as_deref(), Some("Add cache"));
        assert_eq!(ctx.pr_description.as_deref(), Some("Adds a redis cache"));
    }

    #[test]
    fn test_detects_azure_devops() {
        let ctx = detect_with(env_of(&[
            ("TF_BUILD", "True"),
            ("SYSTEM_PULLREQUEST_PULLREQUESTID", "17"),
            ("SYSTEM_PULLREQUEST_TARGETBRANCH", "refs/heads/main"),
            ("BUILD_REPOSITORY_NAME", "infra"),
        ]));
        assert_eq!(ctx.platform, Some(Platform::AzureDevOps));
        assert_eq!(ctx.pr_number.as_deref(), Some("17"));
        assert_eq!(ctx.base_branch.as_deref(), Some("refs/heads/main"));
        // Azure DevOps env vars never carry title/description.
        assert!(ctx.pr_title.is_none());
    }
}
