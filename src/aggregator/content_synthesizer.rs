use handlebars::Handlebars;
use serde::Serialize;

use super::summary::{body_preview, first_line, short_sha};
use crate::error::Result;
use crate::github::types::{PullRequest, PullRequestState, RepositoryChangeSet};

pub const MAX_RELEASES: usize = 5;
pub const MAX_MERGED_PRS: usize = 10;
pub const MAX_OPEN_PRS: usize = 5;
pub const MAX_COMMITS: usize = 5;

const TEMPLATE_NAME: &str = "article";

/// Renders a change set into the HTML body of an article.
///
/// Rendering is a pure function of the change set: sorting and truncation
/// happen here, never in the collector.
pub struct ContentSynthesizer {
    template_engine: Handlebars<'static>,
}

#[derive(Serialize)]
struct ArticleContext {
    repository: String,
    repository_url: String,
    since: String,
    releases: Vec<ReleaseLine>,
    merged_pull_requests: Vec<PullRequestLine>,
    open_pull_requests: Vec<PullRequestLine>,
    commit_total: String,
    commits: Vec<CommitLine>,
}

#[derive(Serialize)]
struct ReleaseLine {
    name: String,
    url: String,
    prerelease: bool,
    preview: Option<String>,
}

#[derive(Serialize)]
struct PullRequestLine {
    number: u64,
    title: String,
    author: String,
    url: String,
}

#[derive(Serialize)]
struct CommitLine {
    sha: String,
    summary: String,
    author: String,
    url: String,
}

impl From<&PullRequest> for PullRequestLine {
    fn from(pr: &PullRequest) -> Self {
        PullRequestLine {
            number: pr.number,
            title: pr.title.clone(),
            author: pr.author_login.clone(),
            url: pr.url.clone(),
        }
    }
}

impl ContentSynthesizer {
    pub fn new() -> Result<Self> {
        let mut template_engine = Handlebars::new();
        template_engine.register_template_string(
            TEMPLATE_NAME,
            include_str!("../../templates/article.html.hbs"),
        )?;
        Ok(Self { template_engine })
    }

    pub fn synthesize(&self, changes: &RepositoryChangeSet) -> Result<String> {
        let context = Self::build_context(changes);
        Ok(self.template_engine.render(TEMPLATE_NAME, &context)?)
    }

    fn build_context(changes: &RepositoryChangeSet) -> ArticleContext {
        let mut releases: Vec<_> = changes.releases.iter().collect();
        releases.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        let releases = releases
            .into_iter()
            .take(MAX_RELEASES)
            .map(|r| ReleaseLine {
                name: r.name.clone(),
                url: r.url.clone(),
                prerelease: r.prerelease,
                preview: body_preview(&r.body),
            })
            .collect();

        let mut merged: Vec<_> = changes.pull_requests.iter().filter(|pr| pr.is_merged()).collect();
        merged.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));
        let merged_pull_requests = merged
            .into_iter()
            .take(MAX_MERGED_PRS)
            .map(PullRequestLine::from)
            .collect();

        let mut open: Vec<_> = changes
            .pull_requests
            .iter()
            .filter(|pr| pr.state == PullRequestState::Open)
            .collect();
        open.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let open_pull_requests = open
            .into_iter()
            .take(MAX_OPEN_PRS)
            .map(PullRequestLine::from)
            .collect();

        let mut commits: Vec<_> = changes.commits.iter().collect();
        commits.sort_by(|a, b| b.author_date.cmp(&a.author_date));
        let commits = commits
            .into_iter()
            .take(MAX_COMMITS)
            .map(|c| CommitLine {
                sha: short_sha(&c.sha).to_string(),
                summary: first_line(&c.message).to_string(),
                author: c.author_name.clone(),
                url: c.url.clone(),
            })
            .collect();

        let commit_total = match changes.commits.len() {
            1 => "1 commit".to_string(),
            n => format!("{} commits", n),
        };

        ArticleContext {
            repository: changes.repo.key(),
            repository_url: changes.repo.html_url(),
            since: changes.since.format("%B %-d, %Y").to_string(),
            releases,
            merged_pull_requests,
            open_pull_requests,
            commit_total,
            commits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::repository::RepositoryRef;
    use crate::github::types::{Commit, Release};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn empty_changes() -> RepositoryChangeSet {
        RepositoryChangeSet {
            repo: RepositoryRef::new("octo", "hello").unwrap(),
            since: base(),
            commits: vec![],
            pull_requests: vec![],
            releases: vec![],
        }
    }

    fn release(tag: &str, day: i64, body: &str, prerelease: bool) -> Release {
        Release {
            tag: tag.to_string(),
            name: format!("Release {}", tag),
            published_at: base() + Duration::days(day),
            url: format!("https://github.com/octo/hello/releases/tag/{}", tag),
            body: body.to_string(),
            prerelease,
        }
    }

    fn pr(number: u64, state: PullRequestState, updated_day: i64, merged_day: Option<i64>) -> PullRequest {
        PullRequest {
            number,
            title: format!("Change {}", number),
            state,
            created_at: base(),
            updated_at: base() + Duration::days(updated_day),
            merged_at: merged_day.map(|d| base() + Duration::days(d)),
            author_login: "dev".to_string(),
            url: format!("https://github.com/octo/hello/pull/{}", number),
        }
    }

    fn commit(sha: &str, hour: i64, message: &str) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            author_name: "Ann".to_string(),
            author_date: base() + Duration::hours(hour),
            url: format!("https://github.com/octo/hello/commit/{}", sha),
        }
    }

    fn render(changes: &RepositoryChangeSet) -> String {
        ContentSynthesizer::new().unwrap().synthesize(changes).unwrap()
    }

    #[test]
    fn empty_change_set_renders_header_and_footer_only() {
        let html = render(&empty_changes());
        assert!(html.contains("Recent activity in octo/hello"));
        assert!(html.contains("Changes since May 1, 2024."));
        assert!(html.contains("https://github.com/octo/hello"));
        assert!(!html.contains("<h3>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut changes = empty_changes();
        changes.releases = vec![release("v1", 1, "notes", false), release("v2", 2, "", true)];
        changes.pull_requests = vec![
            pr(1, PullRequestState::Open, 1, None),
            pr(2, PullRequestState::Closed, 2, Some(2)),
        ];
        changes.commits = vec![commit("aaaaaaaa1", 1, "First"), commit("bbbbbbbb2", 2, "Second")];

        assert_eq!(render(&changes), render(&changes));
    }

    #[test]
    fn keeps_five_newest_releases_in_order() {
        let mut changes = empty_changes();
        changes.releases = (1..=8).map(|d| release(&format!("v{}", d), d, "", false)).collect();

        let html = render(&changes);
        assert_eq!(html.matches("<li>").count(), 5);
        let positions: Vec<usize> = ["v8", "v7", "v6", "v5", "v4"]
            .iter()
            .map(|tag| html.find(&format!("Release {}<", tag)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for dropped in ["v3", "v2", "v1"] {
            assert!(!html.contains(&format!("Release {}<", dropped)));
        }
    }

    #[test]
    fn release_preview_and_prerelease_marker() {
        let mut changes = empty_changes();
        changes.releases = vec![release("v1", 1, "alpha\nbeta\ngamma\ndelta", true)];

        let html = render(&changes);
        assert!(html.contains("Release v1</a> (Pre-release)"));
        assert!(html.contains("alpha beta gamma"));
        assert!(!html.contains("delta"));
    }

    #[test]
    fn closed_unmerged_pull_requests_are_hidden() {
        let mut changes = empty_changes();
        changes.pull_requests = vec![
            pr(1, PullRequestState::Closed, 3, None),
            pr(2, PullRequestState::Closed, 2, Some(2)),
            pr(3, PullRequestState::Open, 1, None),
        ];

        let html = render(&changes);
        assert!(html.contains("<h3>Merged Pull Requests</h3>"));
        assert!(html.contains("<h3>Open Pull Requests</h3>"));
        assert!(html.contains("#2 Change 2"));
        assert!(html.contains("#3 Change 3"));
        assert!(!html.contains("#1 Change 1"));
    }

    #[test]
    fn merged_pull_requests_capped_at_ten_newest_first() {
        let mut changes = empty_changes();
        changes.pull_requests = (1..=12)
            .map(|n| pr(n, PullRequestState::Closed, n as i64, Some(n as i64)))
            .collect();

        let html = render(&changes);
        assert_eq!(html.matches("<li>").count(), 10);
        assert!(html.find("#12 Change 12").unwrap() < html.find("#3 Change 3").unwrap());
        assert!(!html.contains("#2 Change 2<"));
        assert!(!html.contains("#1 Change 1<"));
        assert!(!html.contains("Open Pull Requests"));
    }

    #[test]
    fn open_pull_requests_capped_at_five() {
        let mut changes = empty_changes();
        changes.pull_requests = (1..=7).map(|n| pr(n, PullRequestState::Open, n as i64, None)).collect();

        let html = render(&changes);
        assert_eq!(html.matches("<li>").count(), 5);
        assert!(html.contains("#7 Change 7"));
        assert!(!html.contains("#2 Change 2<"));
    }

    #[test]
    fn commit_summary_counts_all_and_lists_five_first_lines() {
        let mut changes = empty_changes();
        changes.commits = (1..=7)
            .map(|h| commit(&format!("{:0>10}", h), h, &format!("Subject {}\n\nBody {}", h, h)))
            .collect();

        let html = render(&changes);
        assert!(html.contains("7 commits since May 1, 2024."));
        assert_eq!(html.matches("<li>").count(), 5);
        assert!(html.find("Subject 7").unwrap() < html.find("Subject 3").unwrap());
        assert!(!html.contains("Subject 2"));
        assert!(!html.contains("Body"));
        assert!(html.contains("<code>0000000</code>"));
    }

    #[test]
    fn single_commit_is_singular() {
        let mut changes = empty_changes();
        changes.commits = vec![commit("abcdef123", 1, "Only one")];
        assert!(render(&changes).contains("1 commit since"));
    }

    #[test]
    fn html_in_titles_is_escaped() {
        let mut changes = empty_changes();
        let mut open = pr(1, PullRequestState::Open, 1, None);
        open.title = "<script>alert(1)</script>".to_string();
        changes.pull_requests = vec![open];

        let html = render(&changes);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
