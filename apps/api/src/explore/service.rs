//! Decision Service — the entry point the transport calls into.
//!
//! Reads go cache first, then the store, then populate the cache. Writes go
//! straight to the store and leave cached pages and counts alone.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::AppError;
use crate::explore::cache::{CacheError, LikerCache};
use crate::explore::cursor;
use crate::explore::store::DecisionStore;
use crate::models::decision::{LikerInfo, LikersPage};

/// A page of likers as returned to callers, with the boundary re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikedYouPage {
    pub likers: Vec<LikerInfo>,
    pub next_token: Option<String>,
}

impl From<LikersPage> for LikedYouPage {
    fn from(page: LikersPage) -> Self {
        Self {
            likers: page.likers,
            next_token: page.next_boundary.map(cursor::encode),
        }
    }
}

#[derive(Clone)]
pub struct DecisionService {
    store: Arc<dyn DecisionStore>,
    cache: Arc<dyn LikerCache>,
}

impl DecisionService {
    pub fn new(store: Arc<dyn DecisionStore>, cache: Arc<dyn LikerCache>) -> Self {
        Self { store, cache }
    }

    /// Everyone who liked `recipient_id`, newest first.
    pub async fn list_liked_you(
        &self,
        recipient_id: &str,
        token: Option<&str>,
    ) -> Result<LikedYouPage, AppError> {
        self.list_likers(recipient_id, token, false).await
    }

    /// Likers that `recipient_id` has not liked back yet.
    pub async fn list_new_liked_you(
        &self,
        recipient_id: &str,
        token: Option<&str>,
    ) -> Result<LikedYouPage, AppError> {
        self.list_likers(recipient_id, token, true).await
    }

    pub async fn count_liked_you(&self, recipient_id: &str) -> Result<u64, AppError> {
        require_id(recipient_id, "recipient user ID is required")?;

        match self.cache.get_count(recipient_id).await {
            Ok(count) => {
                debug!("Count cache hit for {recipient_id}");
                return Ok(count);
            }
            Err(e) => note_cache_read_failure(e),
        }

        let count = self.store.count_likers(recipient_id).await?;

        if let Err(e) = self.cache.set_count(recipient_id, count).await {
            warn!("Failed to cache liker count for {recipient_id}: {e}");
        }

        Ok(count)
    }

    /// Records a like or pass and reports whether it completed a mutual like.
    pub async fn save_decision(
        &self,
        actor_id: &str,
        recipient_id: &str,
        liked: bool,
    ) -> Result<bool, AppError> {
        if actor_id.is_empty() || recipient_id.is_empty() {
            return Err(AppError::InvalidInput(
                "both actor and recipient user IDs are required".to_string(),
            ));
        }
        if actor_id == recipient_id {
            return Err(AppError::InvalidInput(
                "actor and recipient user IDs must differ".to_string(),
            ));
        }

        let mutual = self
            .store
            .upsert_decision(actor_id, recipient_id, liked)
            .await?;
        Ok(mutual)
    }

    async fn list_likers(
        &self,
        recipient_id: &str,
        token: Option<&str>,
        exclude_mutual: bool,
    ) -> Result<LikedYouPage, AppError> {
        require_id(recipient_id, "recipient user ID is required")?;
        let boundary = cursor::decode(token.unwrap_or_default())?;

        match self
            .cache
            .get_likers_page(recipient_id, boundary, exclude_mutual)
            .await
        {
            Ok(page) => {
                debug!("Likers cache hit for {recipient_id} (exclude_mutual={exclude_mutual})");
                return Ok(page.into());
            }
            Err(e) => note_cache_read_failure(e),
        }

        let page = self
            .store
            .list_likers(recipient_id, boundary, exclude_mutual)
            .await?;

        // Awaited in-line so a cancelled request drops the write with it.
        if let Err(e) = self
            .cache
            .set_likers_page(recipient_id, boundary, exclude_mutual, &page)
            .await
        {
            warn!("Failed to cache likers page for {recipient_id}: {e}");
        }

        Ok(page.into())
    }
}

fn require_id(id: &str, message: &str) -> Result<(), AppError> {
    if id.is_empty() {
        return Err(AppError::InvalidInput(message.to_string()));
    }
    Ok(())
}

/// Any cache read failure falls through to the store; only real faults are logged.
fn note_cache_read_failure(err: CacheError) {
    match err {
        CacheError::Miss => {}
        other => warn!("Cache read failed, falling back to store: {other}"),
    }
}
