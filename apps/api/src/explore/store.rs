//! Decision Store — the durable source of truth for like/pass decisions.
//!
//! `PgDecisionStore` owns the `user_decisions` table. Every read here has exact
//! semantics; the cache in front of it only ever holds copies of these results.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::debug;

use crate::models::decision::{DecisionRow, LikerInfo, LikersPage};

/// Number of likers returned per page.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{op} failed: {source}")]
    Query {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Transaction-scoped lock on the unordered (actor, recipient) pair.
const PAIR_LOCK_SQL: &str = r#"
    SELECT pg_advisory_xact_lock(
        hashtextextended(LEAST($1::TEXT, $2::TEXT) || ':' || GREATEST($1::TEXT, $2::TEXT), 0)
    )
"#;

fn query_failed(op: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |source| StoreError::Query { op, source }
}

#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Inserts or overwrites the (actor, recipient) decision and reports whether
    /// both sides now like each other.
    async fn upsert_decision(
        &self,
        actor_id: &str,
        recipient_id: &str,
        liked: bool,
    ) -> Result<bool, StoreError>;

    /// Lists likers of `recipient_id`, newest first, strictly older than `boundary`.
    async fn list_likers(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
    ) -> Result<LikersPage, StoreError>;

    async fn count_likers(&self, recipient_id: &str) -> Result<u64, StoreError>;
}

pub struct PgDecisionStore {
    pool: PgPool,
    page_size: usize,
}

#[derive(FromRow)]
struct LikerRow {
    actor_user_id: String,
    decision_timestamp: i64,
}

impl From<LikerRow> for LikerInfo {
    fn from(row: LikerRow) -> Self {
        LikerInfo {
            actor_id: row.actor_user_id,
            timestamp: u64::try_from(row.decision_timestamp).unwrap_or_default(),
        }
    }
}

impl PgDecisionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            page_size: PAGE_SIZE,
        }
    }

    #[cfg(test)]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl DecisionStore for PgDecisionStore {
    async fn upsert_decision(
        &self,
        actor_id: &str,
        recipient_id: &str,
        liked: bool,
    ) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("begin decision transaction"))?;

        // Serialise writers on the unordered pair. Under READ COMMITTED the
        // reciprocal check below then sees whichever side committed first.
        sqlx::query(PAIR_LOCK_SQL)
            .bind(actor_id)
            .bind(recipient_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed("lock decision pair"))?;

        // Stamped under the lock so the last writer of a pair carries the latest time.
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, DecisionRow>(
            r#"
            INSERT INTO user_decisions
                (actor_user_id, recipient_user_id, liked_recipient, decision_timestamp)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (actor_user_id, recipient_user_id)
            DO UPDATE SET
                liked_recipient = EXCLUDED.liked_recipient,
                decision_timestamp = EXCLUDED.decision_timestamp
            RETURNING actor_user_id, recipient_user_id, liked_recipient, decision_timestamp
            "#,
        )
        .bind(actor_id)
        .bind(recipient_id)
        .bind(liked)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed("upsert decision"))?;

        let reciprocated: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_decisions
                WHERE actor_user_id = $1
                  AND recipient_user_id = $2
                  AND liked_recipient = true
            )
            "#,
        )
        .bind(recipient_id)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed("check reciprocal decision"))?;

        tx.commit()
            .await
            .map_err(query_failed("commit decision transaction"))?;

        debug!(
            "Stored decision {} -> {} liked={} at {}",
            row.actor_user_id, row.recipient_user_id, row.liked_recipient, row.decision_timestamp
        );

        Ok(row.liked_recipient && reciprocated)
    }

    async fn list_likers(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
    ) -> Result<LikersPage, StoreError> {
        // A boundary past i64::MAX is above every stored timestamp.
        let boundary = boundary.map(|b| i64::try_from(b).unwrap_or(i64::MAX));
        let limit = i64::try_from(self.page_size + 1).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, LikerRow>(
            r#"
            SELECT d.actor_user_id, d.decision_timestamp
            FROM user_decisions d
            WHERE d.recipient_user_id = $1
              AND d.liked_recipient = true
              AND ($2::BIGINT IS NULL OR d.decision_timestamp < $2)
              AND (NOT $3 OR NOT EXISTS (
                    SELECT 1 FROM user_decisions r
                    WHERE r.actor_user_id = d.recipient_user_id
                      AND r.recipient_user_id = d.actor_user_id
                      AND r.liked_recipient = true
              ))
            ORDER BY d.decision_timestamp DESC, d.actor_user_id ASC
            LIMIT $4
            "#,
        )
        .bind(recipient_id)
        .bind(boundary)
        .bind(exclude_mutual)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("list likers"))?;

        let rows = rows.into_iter().map(LikerInfo::from).collect();
        Ok(LikersPage::from_overfetched(rows, self.page_size))
    }

    async fn count_likers(&self, recipient_id: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_decisions
            WHERE recipient_user_id = $1 AND liked_recipient = true
            "#,
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed("count likers"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
