//! Authority result cache

use super::AuthorityCard;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Query identity for cached authority results
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Lookup by authority identifier
    Id(String),
    /// Lookup by name within a set, optionally pinned to a collector number
    Printing {
        name: String,
        set_code: String,
        number: Option<String>,
    },
}

type Slot = Arc<OnceCell<Option<AuthorityCard>>>;

/// Shared cache of authority results, negative results included
///
/// A cached `None` means the authority was asked and had nothing (or failed);
/// it is never asked again for the same query during the run. Concurrent
/// callers asking the same query share one fetch.
#[derive(Default)]
pub struct VerifierCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl VerifierCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, key: CacheKey) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(key).or_default())
    }

    /// Cached result, or the result of `fetch` run once for this query
    ///
    /// Callers arriving while the fetch is in flight wait for it instead of
    /// starting their own.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> Option<AuthorityCard>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<AuthorityCard>>,
    {
        let slot = self.slot(key).await;
        slot.get_or_init(fetch).await.clone()
    }

    /// Cached result: `None` when never asked, `Some(None)` for a negative
    pub async fn get(&self, key: &CacheKey) -> Option<Option<AuthorityCard>> {
        let slots = self.slots.lock().await;
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Record a result; a query already answered keeps its first answer
    pub async fn insert(&self, key: CacheKey, result: Option<AuthorityCard>) {
        let slot = self.slot(key).await;
        let _ = slot.set(result);
    }

    /// Number of answered queries
    pub async fn len(&self) -> usize {
        self.slots.lock().await.values().filter(|s| s.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of cached negative results
    pub async fn negative_count(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|s| matches!(s.get(), Some(None)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_negative_results_are_cached() {
        let cache = VerifierCache::new();
        let key = CacheKey::Id("abc".to_string());

        assert_eq!(cache.get(&key).await, None);
        cache.insert(key.clone(), None).await;
        assert_eq!(cache.get(&key).await, Some(None));
        assert_eq!(cache.negative_count().await, 1);
    }

    #[tokio::test]
    async fn test_printing_keys_distinguish_numbers() {
        let cache = VerifierCache::new();
        let with_number = CacheKey::Printing {
            name: "sol ring".to_string(),
            set_code: "c21".to_string(),
            number: Some("263".to_string()),
        };
        let without_number = CacheKey::Printing {
            name: "sol ring".to_string(),
            set_code: "c21".to_string(),
            number: None,
        };

        cache.insert(with_number.clone(), Some(AuthorityCard::default())).await;
        assert!(cache.get(&with_number).await.is_some());
        assert!(cache.get(&without_number).await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_fetches_share_one_call() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let cache = VerifierCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let key = CacheKey::Id("abc".to_string());
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Some(AuthorityCard::default())
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch(key.clone(), fetch),
            cache.get_or_fetch(key.clone(), fetch)
        );

        assert_eq!(a, b);
        assert!(a.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }
}
