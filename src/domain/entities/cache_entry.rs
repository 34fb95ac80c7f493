use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Value persisted in the local store together with the time it was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub stored_at_epoch_millis: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            stored_at_epoch_millis: Utc::now().timestamp_millis(),
        }
    }

    pub fn age_millis(&self, now_millis: i64) -> i64 {
        (now_millis - self.stored_at_epoch_millis).max(0)
    }

    pub fn is_older_than(&self, max_age: Duration, now_millis: i64) -> bool {
        let max_age_millis = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        self.age_millis(now_millis) > max_age_millis
    }
}
