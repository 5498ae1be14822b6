use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

use super::draft::{ArticleDraft, PostStatus, PublishedPost};
use crate::config::PublishTarget;
use crate::error::{Error, Result};

const API_PATH: &str = "/wp-json/wp/v2";

/// Accepts a finished draft and makes it public somewhere.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, draft: &ArticleDraft) -> Result<PublishedPost>;
}

/// Term collections a post can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Taxonomy {
    Tags,
    Categories,
}

impl Taxonomy {
    fn as_str(&self) -> &'static str {
        match self {
            Taxonomy::Tags => "tags",
            Taxonomy::Categories => "categories",
        }
    }
}

/// Publishes through the WordPress REST API using basic authentication.
///
/// The posts endpoint only takes term IDs, so tag and category names are
/// looked up first and created when missing.
pub struct WordPressClient {
    client: Client,
    target: PublishTarget,
}

#[derive(Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: &'a str,
    status: PostStatus,
    tags: Vec<u64>,
    categories: Vec<u64>,
}

#[derive(Serialize)]
struct NewTerm<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct Term {
    id: u64,
    name: String,
}

/// Body of a rejected term creation, e.g. `{"code": "term_exists", "data": {"term_id": 5}}`.
#[derive(Debug, Deserialize)]
struct TermConflict {
    code: String,
    data: Option<TermConflictData>,
}

#[derive(Debug, Deserialize)]
struct TermConflictData {
    term_id: Option<u64>,
}

impl WordPressClient {
    pub fn new(target: PublishTarget) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, target })
    }

    fn endpoint(&self, collection: &str) -> String {
        format!("{}{}/{}", self.target.url.trim_end_matches('/'), API_PATH, collection)
    }

    /// Map every name to its term ID, creating terms that do not exist yet.
    async fn resolve_terms(&self, taxonomy: Taxonomy, names: &BTreeSet<String>) -> Result<Vec<u64>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = match self.find_term(taxonomy, name).await? {
                Some(id) => id,
                None => self.create_term(taxonomy, name).await?,
            };
            debug!(taxonomy = taxonomy.as_str(), name = %name, id, "resolved term");
            ids.push(id);
        }
        Ok(ids)
    }

    async fn find_term(&self, taxonomy: Taxonomy, name: &str) -> Result<Option<u64>> {
        let url = self.endpoint(taxonomy.as_str());
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.target.username, Some(&self.target.credential))
            .query(&[("search", name), ("per_page", "100")])
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;
        let response = check_status(&url, response).await?;

        let terms: Vec<Term> = response.json().await.map_err(|e| Error::Publish {
            status: 200,
            message: format!("unexpected {} listing: {}", taxonomy.as_str(), e),
        })?;
        // `search` is a substring match; only an exact name counts.
        Ok(terms
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .map(|t| t.id))
    }

    async fn create_term(&self, taxonomy: Taxonomy, name: &str) -> Result<u64> {
        let url = self.endpoint(taxonomy.as_str());
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.target.username, Some(&self.target.credential))
            .json(&NewTerm { name })
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;

        let status = response.status().as_u16();
        if status == 400 {
            // Created concurrently, or the search missed it (e.g. HTML-escaped names).
            let body = response.text().await.unwrap_or_default();
            return match serde_json::from_str::<TermConflict>(&body) {
                Ok(TermConflict {
                    code,
                    data: Some(TermConflictData { term_id: Some(id) }),
                }) if code == "term_exists" => Ok(id),
                _ => Err(Error::Publish { status, message: body }),
            };
        }
        let response = check_status(&url, response).await?;

        let term: Term = response.json().await.map_err(|e| Error::Publish {
            status,
            message: format!("unexpected term response: {}", e),
        })?;
        info!(taxonomy = taxonomy.as_str(), name = %name, id = term.id, "created term");
        Ok(term.id)
    }
}

/// 401/403 become `Auth`, any other non-2xx becomes `Publish`.
async fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(Error::Auth {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(Error::Publish {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

#[async_trait]
impl Publisher for WordPressClient {
    async fn publish(&self, draft: &ArticleDraft) -> Result<PublishedPost> {
        let tags = self.resolve_terms(Taxonomy::Tags, &draft.tags).await?;
        let categories = self.resolve_terms(Taxonomy::Categories, &draft.categories).await?;

        let url = self.endpoint("posts");
        let body = NewPost {
            title: &draft.title,
            content: &draft.body_html,
            status: draft.status,
            tags,
            categories,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.target.username, Some(&self.target.credential))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;
        let response = check_status(&url, response).await?;
        let status = response.status().as_u16();

        let post: PublishedPost = response.json().await.map_err(|e| Error::Publish {
            status,
            message: format!("unexpected response: {}", e),
        })?;
        info!(id = post.id, link = %post.link, "published post");
        Ok(post)
    }
}
