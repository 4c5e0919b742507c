//! Commits as reported by GitHub and GitLab
//!
//! Only payload decoding lives here; fetching is left to the caller.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Length of the abbreviated commit id
const SHORT_ID_LEN: usize = 8;

/// Git hosting service a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Github,
    Gitlab,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Github => f.write_str("GitHub"),
            Provider::Gitlab => f.write_str("GitLab"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("invalid {provider} commit payload: {source}")]
    Payload {
        provider: Provider,
        #[source]
        source: serde_json::Error,
    },
}

/// A commit in the repository history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Abbreviated SHA
    pub id: String,
    /// First line of the commit message
    pub title: String,
    pub date: DateTime<Utc>,
    pub author: String,
    /// Web page of the commit
    pub url: String,
    pub author_email: Option<String>,
    /// Whether the commit touched a dependency manifest
    #[serde(rename = "hasDependenciesChanges")]
    pub has_dependency_changes: bool,
}

impl Commit {
    /// Copy of this commit with the dependency flag set
    pub fn with_dependency_changes(&self, has_dependency_changes: bool) -> Self {
        Self {
            has_dependency_changes,
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct GithubCommit {
    sha: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    commit: GithubCommitDetails,
}

#[derive(Debug, Default, Deserialize)]
struct GithubCommitDetails {
    #[serde(default)]
    message: String,
    #[serde(default)]
    author: GithubAuthor,
}

#[derive(Debug, Default, Deserialize)]
struct GithubAuthor {
    #[serde(default)]
    name: String,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GitlabCommit {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    author_name: String,
    author_email: Option<String>,
    web_url: String,
}

impl From<GithubCommit> for Commit {
    fn from(raw: GithubCommit) -> Self {
        let author = raw.commit.author;
        Self {
            id: short_id(&raw.sha),
            title: first_line(&raw.commit.message),
            date: author.date.unwrap_or_else(Utc::now),
            author: author.name,
            url: raw.html_url,
            author_email: author.email,
            has_dependency_changes: false,
        }
    }
}

impl From<GitlabCommit> for Commit {
    fn from(raw: GitlabCommit) -> Self {
        Self {
            id: short_id(&raw.id),
            title: raw.title,
            date: raw.created_at,
            author: raw.author_name,
            url: raw.web_url,
            author_email: raw.author_email,
            has_dependency_changes: false,
        }
    }
}

/// Decode a JSON array of commits in `provider`'s API format
pub fn parse_commits(provider: Provider, json: &str) -> Result<Vec<Commit>, CommitError> {
    let payload_error = |source| CommitError::Payload { provider, source };

    let commits: Vec<Commit> = match provider {
        Provider::Github => serde_json::from_str::<Vec<GithubCommit>>(json)
            .map_err(payload_error)?
            .into_iter()
            .map(Commit::from)
            .collect(),
        Provider::Gitlab => serde_json::from_str::<Vec<GitlabCommit>>(json)
            .map_err(payload_error)?
            .into_iter()
            .map(Commit::from)
            .collect(),
    };

    tracing::debug!("Decoded {} {provider} commits", commits.len());
    Ok(commits)
}

/// Whether any of `file_names` is a tracked dependency manifest
pub fn touches_dependency_files<S: AsRef<str>>(file_names: &[S], config: &Config) -> bool {
    file_names
        .iter()
        .any(|name| config.is_dependency_file(name.as_ref()))
}

/// Set the dependency flag on every commit from its changed files.
///
/// `changed_files` is keyed by commit SHA, full or abbreviated. When
/// several keys refer to the same commit their file lists are merged.
/// Commits with no entry are left unflagged.
pub fn flag_dependency_changes(
    commits: &[Commit],
    changed_files: &HashMap<String, Vec<String>>,
    config: &Config,
) -> Vec<Commit> {
    commits
        .iter()
        .map(|commit| {
            let touched = changed_files
                .iter()
                .filter(|(sha, _)| same_commit(sha, &commit.id))
                .any(|(_, files)| touches_dependency_files(files, config));
            commit.with_dependency_changes(touched)
        })
        .collect()
}

/// Whether `sha` and the abbreviated `id` name the same commit
fn same_commit(sha: &str, id: &str) -> bool {
    !sha.is_empty() && (sha.starts_with(id) || id.starts_with(sha))
}

fn short_id(sha: &str) -> String {
    sha.chars().take(SHORT_ID_LEN).collect()
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or("").trim().to_string()
}
