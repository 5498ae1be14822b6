use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::error::Result;
use crate::github::client::HttpGet;
use crate::github::pagination::PaginatedFetcher;
use crate::github::repository::RepositoryRef;
use crate::github::types::{
    ApiCommit, ApiPullRequest, ApiRelease, Commit, PullRequest, PullRequestState, Release,
    RepositoryChangeSet,
};

const PER_PAGE: u32 = 100;

/// Gathers commits, pull requests and releases of one repository.
pub struct ChangeCollector<'a, H: ?Sized> {
    http: &'a H,
    api_base: String,
}

impl<'a, H: HttpGet + ?Sized> ChangeCollector<'a, H> {
    pub fn new(http: &'a H, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Collect everything that changed after `since`. Item order within each
    /// list follows the server and carries no meaning.
    pub async fn collect(&self, repo: &RepositoryRef, since: DateTime<Utc>) -> Result<RepositoryChangeSet> {
        info!(repo = %repo, since = %since, "collecting changes");

        let commits = self.commits(repo, since).await?;
        let mut pull_requests = self.pull_requests(repo, PullRequestState::Open, since).await?;
        pull_requests.extend(self.pull_requests(repo, PullRequestState::Closed, since).await?);
        let releases = self.releases(repo, since).await?;

        info!(
            repo = %repo,
            commits = commits.len(),
            pull_requests = pull_requests.len(),
            releases = releases.len(),
            "collected changes"
        );

        Ok(RepositoryChangeSet {
            repo: repo.clone(),
            since,
            commits,
            pull_requests,
            releases,
        })
    }

    fn repo_url(&self, repo: &RepositoryRef, endpoint: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, repo.owner(), repo.name(), endpoint)
    }

    async fn commits(&self, repo: &RepositoryRef, since: DateTime<Utc>) -> Result<Vec<Commit>> {
        let url = format!(
            "{}?since={}&per_page={}",
            self.repo_url(repo, "commits"),
            since.to_rfc3339_opts(SecondsFormat::Secs, true),
            PER_PAGE
        );
        // The server filters by `since` (committer date), so every returned
        // commit is kept even when it was authored before the cutoff.
        let raw: Vec<ApiCommit> = PaginatedFetcher::new(self.http)
            .fetch_all(&url, |_| true)
            .await?;
        let fetched = raw.len();

        let commits: Vec<_> = raw.into_iter().filter_map(ApiCommit::into_commit).collect();
        debug!(fetched, kept = commits.len(), "filtered commits");
        Ok(commits)
    }

    async fn pull_requests(
        &self,
        repo: &RepositoryRef,
        state: PullRequestState,
        since: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>> {
        let url = format!(
            "{}?state={}&sort=updated&direction=desc&per_page={}",
            self.repo_url(repo, "pulls"),
            state.as_str(),
            PER_PAGE
        );
        // Sorted by last update, so a page ending at or before the cutoff is the last useful one.
        let raw: Vec<ApiPullRequest> = PaginatedFetcher::new(self.http)
            .fetch_all(&url, |page: &[ApiPullRequest]| {
                page.last().is_some_and(|pr| pr.updated_at > since)
            })
            .await?;
        let fetched = raw.len();

        let prs: Vec<PullRequest> = raw
            .into_iter()
            .filter(|pr| pr.updated_at > since)
            .map(PullRequest::from)
            .collect();
        debug!(state = state.as_str(), fetched, kept = prs.len(), "filtered pull requests");
        Ok(prs)
    }

    async fn releases(&self, repo: &RepositoryRef, since: DateTime<Utc>) -> Result<Vec<Release>> {
        let url = format!("{}?per_page={}", self.repo_url(repo, "releases"), PER_PAGE);
        // Releases come newest first; stop once a page has nothing published after the cutoff.
        let raw: Vec<ApiRelease> = PaginatedFetcher::new(self.http)
            .fetch_all(&url, |page: &[ApiRelease]| {
                let mut published = page.iter().filter_map(|r| r.published_at).peekable();
                published.peek().is_none() || published.any(|at| at > since)
            })
            .await?;
        let fetched = raw.len();

        let releases: Vec<_> = raw
            .into_iter()
            .filter_map(ApiRelease::into_release)
            .filter(|r| r.published_at > since)
            .collect();
        debug!(fetched, kept = releases.len(), "filtered releases");
        Ok(releases)
    }
}
