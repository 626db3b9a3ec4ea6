//! Short-TTL cache in front of the hot public listings.

use std::time::Duration;

use moka::future::Cache;

const LISTING_TTL: Duration = Duration::from_secs(30);
const LISTING_CAPACITY: u64 = 1_000;

/// Caches serialized listing payloads keyed by the normalized query string.
#[derive(Clone)]
pub struct ListingCache {
    inner: Cache<String, serde_json::Value>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(LISTING_CAPACITY)
                .time_to_live(LISTING_TTL)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.get(key).await
    }

    pub async fn put(&self, key: String, value: serde_json::Value) {
        self.inner.insert(key, value).await;
    }

    /// Drop everything; called after any product or category write.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_and_invalidate() {
        let cache = ListingCache::new();
        cache
            .put("products:p1".into(), serde_json::json!({"items": []}))
            .await;
        assert!(cache.get("products:p1").await.is_some());
        assert!(cache.get("products:p2").await.is_none());

        cache.invalidate_all();
        // moka applies invalidation lazily; run pending tasks to observe it.
        cache.inner.run_pending_tasks().await;
        assert!(cache.get("products:p1").await.is_none());
    }
}
