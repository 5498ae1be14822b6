pub mod draft;
pub mod pipeline;
pub mod retry;
pub mod wordpress;

pub use draft::{merge_tags, ArticleDraft, PostStatus, PublishedPost, DEFAULT_TAGS};
pub use pipeline::{
    PipelineContext, PipelineOutcome, PublishPipeline, PublishRequest, DEFAULT_LOOKBACK_DAYS,
};
pub use retry::RetryPolicy;
pub use wordpress::{Publisher, WordPressClient};
