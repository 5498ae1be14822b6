//! Turns recent GitHub activity of a repository into a blog article and
//! publishes it to WordPress.
//!
//! The flow is [`PublishPipeline`]: validate the request, collect commits,
//! pull requests and releases since a cutoff ([`aggregator::ChangeCollector`]),
//! render them ([`aggregator::ContentSynthesizer`]), then either return a
//! preview or publish and remember when ([`aggregator::PublicationTracker`]).

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod error;
pub mod github;
pub mod publish;

pub use error::{Error, PipelineError, Result, Stage};
pub use publish::{PipelineContext, PipelineOutcome, PublishPipeline, PublishRequest};
