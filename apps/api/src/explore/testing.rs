//! In-memory store and cache used by service and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::explore::cache::{count_key, likers_key, CacheError, LikerCache};
use crate::explore::store::{DecisionStore, StoreError, PAGE_SIZE};
use crate::models::decision::{LikerInfo, LikersPage};

/// Mirrors `PgDecisionStore` semantics over a map keyed by (actor, recipient).
/// The whole upsert runs under one lock, which stands in for the transaction.
pub struct MemoryDecisionStore {
    rows: Mutex<HashMap<(String, String), (bool, u64)>>,
    clock: AtomicU64,
    page_size: usize,
    failing: AtomicBool,
    list_calls: AtomicUsize,
    count_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl Default for MemoryDecisionStore {
    fn default() -> Self {
        Self::with_page_size(PAGE_SIZE)
    }
}

impl MemoryDecisionStore {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            clock: AtomicU64::new(1),
            page_size,
            failing: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
        }
    }

    /// Writes a row with an explicit timestamp, bypassing the call counters.
    pub fn seed(&self, actor: &str, recipient: &str, liked: bool, timestamp: u64) {
        self.rows
            .lock()
            .unwrap()
            .insert((actor.to_string(), recipient.to_string()), (liked, timestamp));
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.list_calls() + self.count_calls() + self.upsert_calls.load(Ordering::SeqCst)
    }

    fn check(&self, op: &'static str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Query {
                op,
                source: sqlx::Error::PoolTimedOut,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DecisionStore for MemoryDecisionStore {
    async fn upsert_decision(
        &self,
        actor_id: &str,
        recipient_id: &str,
        liked: bool,
    ) -> Result<bool, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check("upsert decision")?;

        let now = self.clock.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        rows.insert((actor_id.to_string(), recipient_id.to_string()), (liked, now));
        let reciprocated = matches!(
            rows.get(&(recipient_id.to_string(), actor_id.to_string())),
            Some((true, _))
        );
        Ok(liked && reciprocated)
    }

    async fn list_likers(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
    ) -> Result<LikersPage, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check("list likers")?;

        let rows = self.rows.lock().unwrap();
        let mut likers: Vec<LikerInfo> = rows
            .iter()
            .filter(|((_, recipient), (liked, ts))| {
                recipient == recipient_id && *liked && boundary.map_or(true, |b| *ts < b)
            })
            .filter(|((actor, _), _)| {
                !exclude_mutual
                    || !matches!(
                        rows.get(&(recipient_id.to_string(), actor.clone())),
                        Some((true, _))
                    )
            })
            .map(|((actor, _), (_, ts))| LikerInfo {
                actor_id: actor.clone(),
                timestamp: *ts,
            })
            .collect();

        likers.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.actor_id.cmp(&b.actor_id))
        });
        likers.truncate(self.page_size + 1);
        Ok(LikersPage::from_overfetched(likers, self.page_size))
    }

    async fn count_likers(&self, recipient_id: &str) -> Result<u64, StoreError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check("count likers")?;

        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|((_, recipient), (liked, _))| recipient == recipient_id && *liked)
            .count() as u64)
    }
}

/// Stores serialized values under the same keys as the Redis cache, using the
/// tokio clock so tests can pause and advance time.
pub struct MemoryLikerCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    prefix: String,
    ttl: Duration,
    failing_writes: AtomicBool,
}

impl Default for MemoryLikerCache {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            prefix: "test".to_string(),
            ttl: Duration::from_secs(900),
            failing_writes: AtomicBool::new(false),
        }
    }
}

impl MemoryLikerCache {
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// The stored value for `key` if present and unexpired.
    pub fn raw(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(value, _)| value.clone())
    }

    fn put(&self, key: String, value: String) -> Result<(), CacheError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key, (value, Instant::now() + self.ttl));
        Ok(())
    }
}

#[async_trait]
impl LikerCache for MemoryLikerCache {
    async fn get_likers_page(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
    ) -> Result<LikersPage, CacheError> {
        let key = likers_key(&self.prefix, recipient_id, boundary, exclude_mutual);
        let raw = self.raw(&key).ok_or(CacheError::Miss)?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn set_likers_page(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
        page: &LikersPage,
    ) -> Result<(), CacheError> {
        let key = likers_key(&self.prefix, recipient_id, boundary, exclude_mutual);
        self.put(key, serde_json::to_string(page)?)
    }

    async fn get_count(&self, recipient_id: &str) -> Result<u64, CacheError> {
        let raw = self
            .raw(&count_key(&self.prefix, recipient_id))
            .ok_or(CacheError::Miss)?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn set_count(&self, recipient_id: &str, count: u64) -> Result<(), CacheError> {
        self.put(count_key(&self.prefix, recipient_id), count.to_string())
    }
}
