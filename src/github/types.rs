use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::repository::RepositoryRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_date: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: PullRequestState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present iff the pull request was merged.
    pub merged_at: Option<DateTime<Utc>>,
    pub author_login: String,
    pub url: String,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Closed && self.merged_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    pub name: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub body: String,
    pub prerelease: bool,
}

/// Everything that happened in one repository after `since`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryChangeSet {
    pub repo: RepositoryRef,
    pub since: DateTime<Utc>,
    pub commits: Vec<Commit>,
    pub pull_requests: Vec<PullRequest>,
    pub releases: Vec<Release>,
}

impl RepositoryChangeSet {
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.pull_requests.is_empty() && self.releases.is_empty()
    }
}

// Wire shapes of the GitHub REST v3 responses. Only the fields we read are declared.

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: ApiCommitDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommitDetails {
    pub message: String,
    pub author: Option<ApiCommitAuthor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommitAuthor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPullRequest {
    pub number: u64,
    pub title: String,
    pub state: PullRequestState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub user: Option<ApiUser>,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRelease {
    pub tag_name: String,
    pub name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
}

impl ApiCommit {
    /// `None` when the commit carries no author date to order it by.
    pub(crate) fn into_commit(self) -> Option<Commit> {
        let author = self.commit.author?;
        Some(Commit {
            sha: self.sha,
            message: self.commit.message,
            author_name: author.name.unwrap_or_else(|| "Unknown".to_string()),
            author_date: author.date?,
            url: self.html_url,
        })
    }
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pr: ApiPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            title: pr.title,
            state: pr.state,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            merged_at: pr.merged_at,
            author_login: pr.user.map(|u| u.login).unwrap_or_else(|| "ghost".to_string()),
            url: pr.html_url,
        }
    }
}

impl ApiRelease {
    /// Unpublished (draft) releases have no `published_at` and are skipped.
    pub(crate) fn into_release(self) -> Option<Release> {
        let published_at = self.published_at?;
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.tag_name.clone(),
        };
        Some(Release {
            tag: self.tag_name,
            name,
            published_at,
            url: self.html_url,
            body: self.body.unwrap_or_default(),
            prerelease: self.prerelease,
        })
    }
}
