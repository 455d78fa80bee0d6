//! Page results kept for a short stale time so that flipping back to a
//! recently seen page does not hit the network again.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::grid::{PageRequest, PageResult};

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub query_key: String,
    pub page_index: usize,
    pub page_size: usize,
}

impl PageKey {
    pub fn new(query_key: &str, request: PageRequest) -> Self {
        Self {
            query_key: query_key.to_string(),
            page_index: request.page_index,
            page_size: request.page_size,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PageCache {
    stale_time: Duration,
    entries: HashMap<PageKey, PageResult>,
}

impl PageCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: HashMap::new(),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    fn is_fresh(&self, result: &PageResult, now: Instant) -> bool {
        !self.stale_time.is_zero()
            && now.saturating_duration_since(result.fetched_at) < self.stale_time
    }

    /// Returns the entry only while it is younger than the stale time.
    pub fn get_fresh(&self, key: &PageKey, now: Instant) -> Option<&PageResult> {
        self.entries
            .get(key)
            .filter(|result| self.is_fresh(result, now))
    }

    pub fn insert(&mut self, key: PageKey, result: PageResult) {
        let now = result.fetched_at;
        self.purge_stale(now);
        if self.stale_time.is_zero() {
            return;
        }
        self.entries.insert(key, result);
    }

    /// Drops every entry that is no longer fresh; returns how many went.
    pub fn purge_stale(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let stale_time = self.stale_time;
        self.entries.retain(|_, result| {
            !stale_time.is_zero() && now.saturating_duration_since(result.fetched_at) < stale_time
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}
