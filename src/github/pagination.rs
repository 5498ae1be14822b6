//! Cursor-linked traversal of GitHub list endpoints.
//!
//! GitHub hands out the next page as a `Link: <url>; rel="next"` header
//! rather than accepting offsets, so pages can only be fetched one after
//! the other.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tracing::debug;

use super::client::HttpGet;
use crate::error::{Error, Result};

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).expect("valid Link regex"));

/// Extract the `rel="next"` target from a `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    header
        .split(',')
        .find_map(|entry| NEXT_LINK.captures(entry.trim()))
        .map(|cap| cap[1].to_string())
}

pub struct PaginatedFetcher<'a, H: ?Sized> {
    http: &'a H,
}

impl<'a, H: HttpGet + ?Sized> PaginatedFetcher<'a, H> {
    pub fn new(http: &'a H) -> Self {
        Self { http }
    }

    /// Fetch every page starting at `start`.
    ///
    /// `keep_going` sees each decoded page; returning `false` stops the
    /// traversal after that page (its items are still kept). This is only
    /// an optimization, callers must still filter the returned items.
    pub async fn fetch_all<T, P>(&self, start: &str, mut keep_going: P) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        P: FnMut(&[T]) -> bool,
    {
        let mut items = Vec::new();
        let mut url = start.to_string();
        let mut pages = 0usize;

        loop {
            let page = self.http.get(&url).await?;
            pages += 1;

            match page.status {
                200..=299 => {}
                401 | 403 => {
                    return Err(Error::Auth {
                        url,
                        status: page.status,
                    })
                }
                status => {
                    return Err(Error::transport(
                        url,
                        format!("HTTP {}: {}", status, page.body.trim()),
                    ))
                }
            }

            let batch: Vec<T> = serde_json::from_str(&page.body)
                .map_err(|e| Error::transport(&url, format!("malformed response body: {}", e)))?;
            debug!(url = %url, page = pages, count = batch.len(), "fetched page");

            let more = keep_going(&batch);
            items.extend(batch);

            match page.link.as_deref().and_then(next_link) {
                Some(next) if more => url = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::RawPage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned pages and records every requested URL.
    struct ScriptedHttp {
        pages: Mutex<VecDeque<RawPage>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedHttp {
        fn new(pages: Vec<RawPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpGet for ScriptedHttp {
        async fn get(&self, url: &str) -> Result<RawPage> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::transport(url, "no more scripted pages"))
        }
    }

    fn page(body: &str, next: Option<&str>) -> RawPage {
        RawPage {
            status: 200,
            link: next.map(|n| format!("<{}>; rel=\"next\", <https://x/last>; rel=\"last\"", n)),
            body: body.to_string(),
        }
    }

    #[test]
    fn parses_next_link() {
        let header = r#"<https://api.github.com/repositories/1/pulls?page=2>; rel="next", <https://api.github.com/repositories/1/pulls?page=5>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/pulls?page=2")
        );
    }

    #[test]
    fn next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=4>; rel="prev""#;
        assert_eq!(next_link(header), None);
    }

    #[tokio::test]
    async fn follows_cursor_until_exhausted() {
        let http = ScriptedHttp::new(vec![
            page("[1, 2]", Some("https://api/p2")),
            page("[3]", Some("https://api/p3")),
            page("[4, 5]", None),
        ]);

        let items: Vec<u32> = PaginatedFetcher::new(&http)
            .fetch_all("https://api/p1", |_| true)
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            http.requested(),
            vec!["https://api/p1", "https://api/p2", "https://api/p3"]
        );
    }

    #[tokio::test]
    async fn stops_when_predicate_declines() {
        let http = ScriptedHttp::new(vec![
            page("[10, 9]", Some("https://api/p2")),
            page("[8, 2]", Some("https://api/p3")),
            page("[1]", None),
        ]);

        let items: Vec<u32> = PaginatedFetcher::new(&http)
            .fetch_all("https://api/p1", |batch: &[u32]| batch.iter().all(|n| *n > 5))
            .await
            .unwrap();

        // The page that tripped the predicate is kept in full.
        assert_eq!(items, vec![10, 9, 8, 2]);
        assert_eq!(http.requested().len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_is_auth_error() {
        let http = ScriptedHttp::new(vec![RawPage {
            status: 401,
            link: None,
            body: r#"{"message":"Bad credentials"}"#.to_string(),
        }]);

        let err = PaginatedFetcher::new(&http)
            .fetch_all::<u32, _>("https://api/p1", |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth { status: 401, .. }));
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let http = ScriptedHttp::new(vec![
            page("[1]", Some("https://api/p2")),
            RawPage {
                status: 500,
                link: None,
                body: "oops".to_string(),
            },
        ]);

        let err = PaginatedFetcher::new(&http)
            .fetch_all::<u32, _>("https://api/p1", |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { ref url, .. } if url == "https://api/p2"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn undecodable_body_is_transport_error() {
        let http = ScriptedHttp::new(vec![page("{not json", None)]);
        let err = PaginatedFetcher::new(&http)
            .fetch_all::<u32, _>("https://api/p1", |_| true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
