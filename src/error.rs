use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The repository identifier could not be parsed.
    #[error("invalid repository reference `{0}`")]
    Validation(String),

    /// A required credential or publish target is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// 401/403 from GitHub or the publish target. Never retried.
    #[error("authentication rejected by {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// Network failure, non-auth HTTP failure or an undecodable body.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The publish target answered with a non-success status.
    #[error("publish rejected (HTTP {status}): {message}")]
    Publish { status: u16, message: String },

    #[error("invalid article template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("failed to render article: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl Error {
    pub(crate) fn transport(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

/// Step of a [`PublishPipeline`](crate::publish::PublishPipeline) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Collecting,
    Synthesizing,
    Previewing,
    Publishing,
    Tracking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Collecting => "collecting",
            Stage::Synthesizing => "synthesizing",
            Stage::Previewing => "previewing",
            Stage::Publishing => "publishing",
            Stage::Tracking => "tracking",
        };
        f.write_str(name)
    }
}

/// A failed pipeline run, tagged with where and for which repository it failed.
#[derive(Debug, Error)]
#[error("{stage} failed for {repo}: {source}")]
pub struct PipelineError {
    pub repo: String,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(repo: impl Into<String>, stage: Stage, source: Error) -> Self {
        Self {
            repo: repo.into(),
            stage,
            source,
        }
    }

    pub fn kind(&self) -> &Error {
        &self.source
    }
}
