//! HTTP endpoint handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use cadence_core::{NewReviewItem, PreviewResults, ReviewItem, ReviewStats, StudySession};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::error::{ApiError, ITEM_NOT_FOUND};
use super::state::AppState;

const DEFAULT_SESSION_LIMIT: i32 = 50;
const DEFAULT_QUEUE_LIMIT: i32 = 20;
const MAX_LIMIT: i32 = 500;

/// Query string for `POST /review/sm2`
#[derive(Debug, Deserialize)]
pub struct ReviewParams {
    pub user_id: String,
    pub item_id: String,
    pub recall_rating: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i32>,
}

impl LimitParams {
    fn resolve(&self, default: i32) -> i32 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

fn query_or_400<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Apply an SM-2 review and log it
pub async fn review_sm2(
    State(state): State<AppState>,
    query: Result<Query<ReviewParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let params = query_or_400(query)?;
    if params.user_id.trim().is_empty() || params.item_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "user_id and item_id must not be empty".to_string(),
        ));
    }

    let ReviewParams {
        user_id,
        item_id,
        recall_rating,
    } = params;
    let outcome = state
        .with_storage(move |storage| storage.record_review(&user_id, &item_id, recall_rating))
        .await?;

    info!(
        item_id = %outcome.item.id,
        interval = outcome.item.interval,
        next_review = %outcome.next_review,
        "SM-2 review applied"
    );

    Ok(Json(serde_json::json!({
        "status": "success",
        "nextReview": outcome.next_review.to_rfc3339(),
    })))
}

/// Seed a review item
pub async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<NewReviewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<ReviewItem>), ApiError> {
    let Json(input) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let item = state
        .with_storage(move |storage| storage.create_item(input))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get a single item by ID
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewItem>, ApiError> {
    state
        .with_storage(move |storage| storage.get_item(&id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))
}

/// What each rating would do to an item
pub async fn preview_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PreviewResults>, ApiError> {
    let preview = state
        .with_storage(move |storage| storage.preview_review(&id))
        .await?;
    Ok(Json(preview))
}

/// Session log for one item
pub async fn item_sessions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<StudySession>>, ApiError> {
    let limit = query_or_400(query)?.resolve(DEFAULT_SESSION_LIMIT);
    let sessions = state
        .with_storage(move |storage| {
            if storage.get_item(&id)?.is_none() {
                return Err(cadence_core::StorageError::NotFound(id));
            }
            storage.get_sessions_for_item(&id, limit)
        })
        .await?;
    Ok(Json(sessions))
}

/// Session log for one learner
pub async fn user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<StudySession>>, ApiError> {
    let limit = query_or_400(query)?.resolve(DEFAULT_SESSION_LIMIT);
    let sessions = state
        .with_storage(move |storage| storage.get_sessions_for_user(&user_id, limit))
        .await?;
    Ok(Json(sessions))
}

/// Items due for review
pub async fn review_queue(
    State(state): State<AppState>,
    query: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let limit = query_or_400(query)?.resolve(DEFAULT_QUEUE_LIMIT);
    let items = state
        .with_storage(move |storage| storage.get_review_queue(limit))
        .await?;

    Ok(Json(serde_json::json!({
        "total": items.len(),
        "items": items,
    })))
}

/// Get review statistics
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<ReviewStats>, ApiError> {
    let stats = state.with_storage(|storage| storage.get_stats()).await?;
    Ok(Json(stats))
}

/// Health check
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let policy = state.storage.quality_policy();
    let stats = state.with_storage(|storage| storage.get_stats()).await?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "qualityPolicy": policy.as_str(),
        "totalItems": stats.total_items,
        "itemsDue": stats.items_due,
    })))
}
