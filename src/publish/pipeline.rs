//! End-to-end run for one repository:
//! validate, collect, synthesize, then preview or publish and track.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

use super::draft::{merge_tags, ArticleDraft, PostStatus, PublishedPost};
use super::retry::RetryPolicy;
use super::wordpress::{Publisher, WordPressClient};
use crate::aggregator::{ChangeCollector, ContentSynthesizer, PublicationTracker};
use crate::clock::{Clock, SystemClock};
use crate::config::{Credentials, PublishTarget};
use crate::error::{Error, PipelineError, Result, Stage};
use crate::github::{GitHubClient, RepositoryRef, DEFAULT_API_BASE};

/// Look-back window used when a repository has never been published.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// State shared by every run of a pipeline.
#[derive(Clone)]
pub struct PipelineContext {
    pub credentials: Credentials,
    pub tracker: Arc<PublicationTracker>,
    pub clock: Arc<dyn Clock>,
    pub retry: RetryPolicy,
    pub github_api: String,
}

impl PipelineContext {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            tracker: Arc::new(PublicationTracker::new()),
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
            github_api: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<PublicationTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_github_api(mut self, api_base: impl Into<String>) -> Self {
        self.github_api = api_base.into();
        self
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    /// `owner/name` or a GitHub URL.
    pub repository: String,
    /// Explicit lower bound; falls back to the tracker, then to the look-back window.
    pub since: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub status: PostStatus,
    pub preview: bool,
    /// Stop after collecting when nothing happened.
    pub skip_if_empty: bool,
}

impl PublishRequest {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Default::default()
        }
    }

    pub fn for_repo(owner: &str, name: &str) -> Self {
        Self::new(format!("{}/{}", owner, name))
    }

    pub fn preview(mut self) -> Self {
        self.preview = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Preview {
        draft: ArticleDraft,
        since: DateTime<Utc>,
    },
    Published {
        post: PublishedPost,
        since: DateTime<Utc>,
        recorded_at: DateTime<Utc>,
    },
    NoActivity {
        since: DateTime<Utc>,
    },
}

pub struct PublishPipeline {
    context: PipelineContext,
    synthesizer: ContentSynthesizer,
    publisher: Option<Arc<dyn Publisher>>,
}

impl PublishPipeline {
    pub fn new(context: PipelineContext) -> Result<Self> {
        Ok(Self {
            context,
            synthesizer: ContentSynthesizer::new()?,
            publisher: None,
        })
    }

    /// Replace the WordPress client with another publisher.
    pub fn with_publisher(mut self, publisher: impl Publisher + 'static) -> Self {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Explicit value, else last publication, else now minus the look-back window.
    pub fn resolve_since(&self, repo: &RepositoryRef, explicit: Option<DateTime<Utc>>) -> DateTime<Utc> {
        explicit
            .or_else(|| self.context.tracker.last_instant(&repo.key()))
            .unwrap_or_else(|| self.context.clock.now() - Duration::days(DEFAULT_LOOKBACK_DAYS))
    }

    pub async fn run(&self, request: &PublishRequest) -> std::result::Result<PipelineOutcome, PipelineError> {
        let (repo, github, target) = self.validate(request)?;
        let key = repo.key();

        info!(repo = %key, stage = %Stage::Collecting, "pipeline stage");
        let since = self.resolve_since(&repo, request.since);
        let collector = ChangeCollector::new(&github, github.api_base());
        let (collector, repo_ref) = (&collector, &repo);
        let changes = self
            .context
            .retry
            .run(move || collector.collect(repo_ref, since))
            .await
            .map_err(|e| PipelineError::new(&key, Stage::Collecting, e))?;

        if request.skip_if_empty && changes.is_empty() {
            info!(repo = %key, since = %since, "no activity, nothing to publish");
            return Ok(PipelineOutcome::NoActivity { since });
        }

        info!(repo = %key, stage = %Stage::Synthesizing, "pipeline stage");
        let body_html = self
            .synthesizer
            .synthesize(&changes)
            .map_err(|e| PipelineError::new(&key, Stage::Synthesizing, e))?;
        let title = match request.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!(
                "Updates from {} - {}",
                key,
                self.context.clock.now().format("%B %Y")
            ),
        };
        let draft = ArticleDraft {
            title,
            status: request.status,
            tags: merge_tags(request.tags.iter().cloned()),
            categories: request
                .categories
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            body_html,
        };

        let Some(target) = target else {
            info!(repo = %key, stage = %Stage::Previewing, "pipeline stage");
            return Ok(PipelineOutcome::Preview { draft, since });
        };

        info!(repo = %key, stage = %Stage::Publishing, "pipeline stage");
        let post = self
            .publish(&draft, target)
            .await
            .map_err(|e| PipelineError::new(&key, Stage::Publishing, e))?;

        let recorded_at = self.context.clock.now();
        self.context.tracker.record(key.clone(), recorded_at);
        info!(repo = %key, stage = %Stage::Tracking, recorded_at = %recorded_at, "pipeline stage");

        Ok(PipelineOutcome::Published {
            post,
            since,
            recorded_at,
        })
    }

    /// Checks that need no network. The publish target is `None` in preview mode.
    fn validate(
        &self,
        request: &PublishRequest,
    ) -> std::result::Result<(RepositoryRef, GitHubClient, Option<PublishTarget>), PipelineError> {
        let fail = |e: Error| PipelineError::new(&request.repository, Stage::Validating, e);

        let repo: RepositoryRef = request.repository.parse().map_err(fail)?;
        let token = self
            .context
            .credentials
            .github_token()
            .ok_or_else(|| fail(Error::Config("no GitHub credential configured".to_string())))?;

        let target = if request.preview {
            None
        } else {
            let target = self.context.credentials.publish_target().ok_or_else(|| {
                fail(Error::Config(
                    "publishing needs a WordPress URL, username and credential".to_string(),
                ))
            })?;
            Some(target)
        };

        let github = GitHubClient::new(token, self.context.github_api.as_str()).map_err(fail)?;
        info!(repo = %repo, preview = request.preview, "validated request");
        Ok((repo, github, target))
    }

    async fn publish(&self, draft: &ArticleDraft, target: PublishTarget) -> Result<PublishedPost> {
        let wordpress;
        let publisher: &dyn Publisher = match &self.publisher {
            Some(publisher) => publisher.as_ref(),
            None => {
                wordpress = WordPressClient::new(target)?;
                &wordpress
            }
        };
        self.context.retry.run(move || publisher.publish(draft)).await
    }
}
