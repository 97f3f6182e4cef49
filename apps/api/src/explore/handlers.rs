//! Axum route handlers for the Explore API.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::explore::service::LikedYouPage;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListLikedYouQuery {
    #[serde(default)]
    pub recipient_user_id: String,
    pub pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountLikedYouQuery {
    #[serde(default)]
    pub recipient_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct Liker {
    pub actor_id: String,
    pub unix_timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct ListLikedYouResponse {
    pub likers: Vec<Liker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_pagination_token: Option<String>,
}

impl From<LikedYouPage> for ListLikedYouResponse {
    fn from(page: LikedYouPage) -> Self {
        Self {
            likers: page
                .likers
                .into_iter()
                .map(|l| Liker {
                    actor_id: l.actor_id,
                    unix_timestamp: l.timestamp,
                })
                .collect(),
            next_pagination_token: page.next_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountLikedYouResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct PutDecisionRequest {
    #[serde(default)]
    pub actor_user_id: String,
    #[serde(default)]
    pub recipient_user_id: String,
    /// An absent flag records a pass.
    #[serde(default)]
    pub liked_recipient: bool,
}

#[derive(Debug, Serialize)]
pub struct PutDecisionResponse {
    pub mutual_likes: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/explore/liked-you
pub async fn handle_list_liked_you(
    State(state): State<AppState>,
    Query(params): Query<ListLikedYouQuery>,
) -> Result<Json<ListLikedYouResponse>, AppError> {
    let page = state
        .explore
        .list_liked_you(&params.recipient_user_id, params.pagination_token.as_deref())
        .await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/explore/liked-you/new
///
/// Same as the full listing minus likers the recipient already liked back.
pub async fn handle_list_new_liked_you(
    State(state): State<AppState>,
    Query(params): Query<ListLikedYouQuery>,
) -> Result<Json<ListLikedYouResponse>, AppError> {
    let page = state
        .explore
        .list_new_liked_you(&params.recipient_user_id, params.pagination_token.as_deref())
        .await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/explore/liked-you/count
pub async fn handle_count_liked_you(
    State(state): State<AppState>,
    Query(params): Query<CountLikedYouQuery>,
) -> Result<Json<CountLikedYouResponse>, AppError> {
    let count = state
        .explore
        .count_liked_you(&params.recipient_user_id)
        .await?;
    Ok(Json(CountLikedYouResponse { count }))
}

/// PUT /api/v1/explore/decisions
pub async fn handle_put_decision(
    State(state): State<AppState>,
    payload: Result<Json<PutDecisionRequest>, JsonRejection>,
) -> Result<Json<PutDecisionResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let mutual_likes = state
        .explore
        .save_decision(&req.actor_user_id, &req.recipient_user_id, req.liked_recipient)
        .await?;
    Ok(Json(PutDecisionResponse { mutual_likes }))
}
