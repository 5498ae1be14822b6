use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TAGS: [&str; 3] = ["GitHub", "Development", "Updates"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    #[default]
    Draft,
    Private,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PostStatus::Publish => "publish",
            PostStatus::Draft => "draft",
            PostStatus::Private => "private",
        })
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "publish" => Ok(PostStatus::Publish),
            "draft" => Ok(PostStatus::Draft),
            "private" => Ok(PostStatus::Private),
            _ => Err(format!("Unknown post status: {}", s)),
        }
    }
}

/// A synthesized article, ready to preview or hand to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub status: PostStatus,
    pub tags: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    #[serde(rename = "content")]
    pub body_html: String,
}

/// What the publish target reports back for a created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub id: u64,
    pub link: String,
}

/// Caller tags plus the default set, deduplicated.
pub fn merge_tags<I, S>(extra: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    DEFAULT_TAGS
        .iter()
        .map(|t| t.to_string())
        .chain(extra.into_iter().map(Into::into))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
