use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One directed preference. At most one row exists per (actor, recipient) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DecisionRow {
    pub actor_user_id: String,
    pub recipient_user_id: String,
    pub liked_recipient: bool,
    /// Seconds since epoch, stamped by the store on every write.
    pub decision_timestamp: i64,
}

/// Projection of a `liked_recipient = true` row as seen by its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikerInfo {
    pub actor_id: String,
    pub timestamp: u64,
}

/// One page of likers plus the exclusive upper bound for the following page.
///
/// This is also the cached value shape, so `next_boundary` serializes as
/// `timestamp` to stay readable by other consumers of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikersPage {
    pub likers: Vec<LikerInfo>,
    #[serde(rename = "timestamp")]
    pub next_boundary: Option<u64>,
}

impl LikersPage {
    /// Builds a page from up to `page_size + 1` rows already in listing order.
    ///
    /// The extra row is only a marker that another page exists. It is
    /// discarded and the last kept row's timestamp becomes the boundary.
    ///
    /// The boundary is exclusive and carries no tiebreak, so rows sharing the
    /// last kept row's timestamp that did not fit on this page are never listed.
    pub fn from_overfetched(mut rows: Vec<LikerInfo>, page_size: usize) -> Self {
        if rows.len() <= page_size {
            return Self {
                likers: rows,
                next_boundary: None,
            };
        }

        rows.truncate(page_size);
        let next_boundary = rows.last().map(|liker| liker.timestamp);
        Self {
            likers: rows,
            next_boundary,
        }
    }
}
