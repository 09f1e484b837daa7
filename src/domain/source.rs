//! Candidate changes: merged pull requests and raw commits
//!
//! Both kinds are represented by [`ChangeSource`] and expose the same
//! accessors, so attribution never needs to know which one it holds.

use crate::error::Result;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

const SHORT_SHA_LEN: usize = 7;

/// Reference appended to a change's text (`[#12](url)` or `(abc1234)`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLink {
    pub label: String,
    pub url: Option<String>,
}

impl fmt::Display for ChangeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "[{}]({})", self.label, url),
            None => write!(f, "({})", self.label),
        }
    }
}

/// A merged pull request
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub html_url: String,
    /// Head commit sha
    pub head: String,
    pub labels: Vec<String>,
    /// Login of the author
    pub author: Option<String>,
}

/// A commit listed explicitly as a change
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommit {
    pub sha: String,
    /// Full commit message
    pub message: String,
    pub author: String,
    /// Commit time, seconds since the epoch
    pub time: i64,
    /// Web URL of the commit, when the hosting project is known
    pub url: Option<String>,
    /// Override text from configuration (empty for none)
    pub text: String,
    /// Category label from configuration (empty for none)
    pub category: String,
    /// Release filter from configuration
    pub version_filter: Vec<String>,
}

impl RawCommit {
    /// Create a raw commit change with no configured overrides
    pub fn new(
        sha: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        time: i64,
    ) -> Self {
        RawCommit {
            sha: sha.into(),
            message: message.into(),
            author: author.into(),
            time,
            url: None,
            text: String::new(),
            category: String::new(),
            version_filter: Vec::new(),
        }
    }

    /// Abbreviated sha
    pub fn short_sha(&self) -> &str {
        let end = self
            .sha
            .char_indices()
            .nth(SHORT_SHA_LEN)
            .map(|(idx, _)| idx)
            .unwrap_or(self.sha.len());
        &self.sha[..end]
    }
}

/// A candidate change, from either source kind
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSource {
    PullRequest(PullRequest),
    Commit(RawCommit),
}

impl ChangeSource {
    /// Short identifier used in reports (e.g., "#12", "abc1234")
    pub fn id(&self) -> String {
        match self {
            ChangeSource::PullRequest(pr) => format!("#{}", pr.number),
            ChangeSource::Commit(commit) => commit.short_sha().to_string(),
        }
    }

    /// Intrinsic labels of the change
    pub fn labels(&self) -> Vec<String> {
        match self {
            ChangeSource::PullRequest(pr) => pr.labels.clone(),
            ChangeSource::Commit(commit) if commit.category.trim().is_empty() => Vec::new(),
            ChangeSource::Commit(commit) => vec![commit.category.trim().to_string()],
        }
    }

    /// Reference to the commit that carries the change
    pub fn commit_ref(&self) -> &str {
        match self {
            ChangeSource::PullRequest(pr) => &pr.head,
            ChangeSource::Commit(commit) => &commit.sha,
        }
    }

    /// Fallback display text
    pub fn title(&self) -> &str {
        match self {
            ChangeSource::PullRequest(pr) => &pr.title,
            ChangeSource::Commit(commit) => commit.message.lines().next().unwrap_or(""),
        }
    }

    /// Free text scanned for changelog directives
    pub fn body(&self) -> &str {
        match self {
            ChangeSource::PullRequest(pr) => &pr.body,
            ChangeSource::Commit(commit) => &commit.message,
        }
    }

    /// Ordering key within a category
    pub fn sort_key(&self) -> i64 {
        match self {
            ChangeSource::PullRequest(pr) => i64::try_from(pr.number).unwrap_or(i64::MAX),
            ChangeSource::Commit(commit) => commit.time,
        }
    }

    /// Reference link appended to the display text
    pub fn link(&self) -> ChangeLink {
        match self {
            ChangeSource::PullRequest(pr) => ChangeLink {
                label: format!("#{}", pr.number),
                url: Some(pr.html_url.clone()),
            },
            ChangeSource::Commit(commit) => ChangeLink {
                label: commit.short_sha().to_string(),
                url: commit.url.clone(),
            },
        }
    }

    /// Author attribution, already formatted for display
    pub fn author(&self) -> Option<String> {
        match self {
            ChangeSource::PullRequest(pr) => pr.author.as_ref().map(|login| format!("@{}", login)),
            ChangeSource::Commit(commit) if commit.author.is_empty() => None,
            ChangeSource::Commit(commit) => Some(commit.author.clone()),
        }
    }
}

#[derive(Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Deserialize)]
struct ApiCommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiPullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    #[serde(default)]
    merged_at: Option<String>,
    head: ApiCommitRef,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    #[serde(default)]
    user: Option<ApiUser>,
}

/// Parse a pull request list in the hosting API's JSON shape.
///
/// Pull requests that were closed without being merged are dropped.
pub fn parse_pull_requests(json: &str) -> Result<Vec<PullRequest>> {
    let api: Vec<ApiPullRequest> = serde_json::from_str(json)?;
    let total = api.len();

    let merged: Vec<PullRequest> = api
        .into_iter()
        .filter(|pr| pr.merged_at.is_some())
        .map(|pr| PullRequest {
            number: pr.number,
            title: pr.title,
            body: pr.body.unwrap_or_default(),
            html_url: pr.html_url,
            head: pr.head.sha,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            author: pr.user.map(|u| u.login),
        })
        .collect();

    debug!(total, merged = merged.len(), "parsed pull requests");
    Ok(merged)
}

/// Load a pull request export from disk
pub fn load_pull_requests(path: &Path) -> Result<Vec<PullRequest>> {
    let json = fs::read_to_string(path)?;
    parse_pull_requests(&json)
}
