use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{ParticipantDirectory, StoreError};
use crate::models::ParticipantId;

/// Participant directory with an in-memory name cache in front
///
/// Names change rarely and are resolved once per pair per announcement, so a
/// bounded TTL cache spares the backing store. Lookup failures are not cached.
pub struct CachedDirectory {
    inner: Arc<dyn ParticipantDirectory>,
    names: moka::future::Cache<ParticipantId, String>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn ParticipantDirectory>, max_entries: u64, ttl_secs: u64) -> Self {
        let names = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, names }
    }
}

#[async_trait]
impl ParticipantDirectory for CachedDirectory {
    async fn resolve(&self, id: &ParticipantId) -> Result<String, StoreError> {
        if let Some(name) = self.names.get(id).await {
            tracing::trace!("Directory cache hit: {}", id);
            return Ok(name);
        }

        tracing::trace!("Directory cache miss: {}", id);
        let name = self.inner.resolve(id).await?;
        self.names.insert(id.clone(), name.clone()).await;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Participant;
    use crate::services::InMemoryDirectory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDirectory {
        inner: InMemoryDirectory,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ParticipantDirectory for CountingDirectory {
        async fn resolve(&self, id: &ParticipantId) -> Result<String, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(id).await
        }
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_cache() {
        let backing = Arc::new(CountingDirectory {
            inner: InMemoryDirectory::new([Participant {
                id: "42".into(),
                display_name: "ada".to_string(),
            }]),
            calls: AtomicUsize::new(0),
        });
        let cached = CachedDirectory::new(backing.clone(), 10, 60);

        assert_eq!(cached.resolve(&"42".into()).await.unwrap(), "ada");
        assert_eq!(cached.resolve(&"42".into()).await.unwrap(), "ada");
        assert_eq!(backing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_participant_not_cached() {
        let cached = CachedDirectory::new(Arc::new(InMemoryDirectory::default()), 10, 60);
        assert!(matches!(
            cached.resolve(&"nobody".into()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(cached.resolve(&"nobody".into()).await.is_err());
    }
}
