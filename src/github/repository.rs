use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An `owner/name` pair identifying one GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

/// Outcome of parsing a repository identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRepository {
    Parsed { owner: String, name: String },
    Invalid,
}

impl RepositoryRef {
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        let owner = owner.trim();
        let name = name.trim();
        if !is_segment(owner) || !is_segment(name) {
            return Err(Error::Validation(format!("{}/{}", owner, name)));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used to index the publication tracker.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = Error;

    /// Accepts `owner/name` or anything matching `github.com[/:]owner/name[.git][/]`.
    fn from_str(input: &str) -> Result<Self> {
        let parsed = if input.contains("github.com") {
            parse_github_url(input)
        } else {
            parse_shorthand(input)
        };
        match parsed {
            ParsedRepository::Parsed { owner, name } => Ok(Self { owner, name }),
            ParsedRepository::Invalid => Err(Error::Validation(input.to_string())),
        }
    }
}

/// Parse `https://github.com/owner/name`, `git@github.com:owner/name.git`
/// and similar forms. Anything after the optional trailing slash is rejected.
pub fn parse_github_url(input: &str) -> ParsedRepository {
    let input = input.trim();
    let Some(idx) = input.find("github.com") else {
        return ParsedRepository::Invalid;
    };
    let rest = &input[idx + "github.com".len()..];
    let Some(rest) = rest.strip_prefix('/').or_else(|| rest.strip_prefix(':')) else {
        return ParsedRepository::Invalid;
    };
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    split_pair(rest)
}

fn parse_shorthand(input: &str) -> ParsedRepository {
    split_pair(input.trim())
}

fn split_pair(path: &str) -> ParsedRepository {
    match path.split_once('/') {
        Some((owner, name)) if is_segment(owner) && is_segment(name) => ParsedRepository::Parsed {
            owner: owner.to_string(),
            name: name.to_string(),
        },
        _ => ParsedRepository::Invalid,
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
