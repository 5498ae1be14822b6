use serde::{Deserialize, Serialize};

/// Resolved credentials. Every field is optional; the pipeline decides
/// which ones a given run actually needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub github_credential: Option<String>,
    #[serde(default)]
    pub publish_url: Option<String>,
    #[serde(default)]
    pub publish_username: Option<String>,
    #[serde(default)]
    pub publish_credential: Option<String>,
}

/// Everything needed to reach a WordPress site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub url: String,
    pub username: String,
    pub credential: String,
}

impl Credentials {
    /// Field-by-field overlay: any value set in `other` wins.
    pub fn overlay(self, other: Credentials) -> Credentials {
        Credentials {
            github_credential: other.github_credential.or(self.github_credential),
            publish_url: other.publish_url.or(self.publish_url),
            publish_username: other.publish_username.or(self.publish_username),
            publish_credential: other.publish_credential.or(self.publish_credential),
        }
    }

    pub fn github_token(&self) -> Option<&str> {
        non_blank(&self.github_credential)
    }

    /// `None` unless URL, username and credential are all present.
    pub fn publish_target(&self) -> Option<PublishTarget> {
        Some(PublishTarget {
            url: non_blank(&self.publish_url)?.to_string(),
            username: non_blank(&self.publish_username)?.to_string(),
            credential: non_blank(&self.publish_credential)?.to_string(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
