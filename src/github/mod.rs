pub mod client;
pub mod pagination;
pub mod repository;
pub mod types;

pub use client::{GitHubClient, HttpGet, RawPage, DEFAULT_API_BASE};
pub use pagination::PaginatedFetcher;
pub use repository::{ParsedRepository, RepositoryRef};
pub use types::{Commit, PullRequest, PullRequestState, Release, RepositoryChangeSet};
