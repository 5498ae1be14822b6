use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Remembers, per repository key, when an article was last published.
///
/// Lives for the lifetime of the process only. Reads and writes are
/// serialized; the last `record` for a key wins.
#[derive(Debug, Default)]
pub struct PublicationTracker {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl PublicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_instant(&self, repo_key: &str) -> Option<DateTime<Utc>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(repo_key)
            .copied()
    }

    pub fn record(&self, repo_key: impl Into<String>, at: DateTime<Utc>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(repo_key.into(), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn unknown_repository_has_no_instant() {
        let tracker = PublicationTracker::new();
        assert_eq!(tracker.last_instant("octo/hello"), None);
    }

    #[test]
    fn record_overwrites_unconditionally() {
        let tracker = PublicationTracker::new();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let earlier = later - Duration::days(10);

        tracker.record("octo/hello", later);
        tracker.record("octo/hello", earlier);

        assert_eq!(tracker.last_instant("octo/hello"), Some(earlier));
        assert_eq!(tracker.last_instant("octo/other"), None);
    }
}
