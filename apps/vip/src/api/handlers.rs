//! Route handlers and wire types.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value, json};
use tracing::{debug, info};
use vip_core::{Points, ResolvedTier, TierDefinition, UpgradeResult, VipStore};

use super::{AppState, error::ApiError};

/// Wire value of `next_level` when no further tier exists.
pub use vip_core::MAX_TIER_SENTINEL;

/// `user_id` used by the query status route when none is given.
pub const GUEST_USER_ID: &str = "guest";

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub user_id: Option<String>,
    /// `?points=` with no value reads as absent.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub points: Option<Points>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPointsRequest {
    pub user_id: Option<String>,
    pub points: Option<Number>,
}

/// Resolved-tier payload shared by both status routes and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub user_id: String,
    pub vip_level: String,
    pub vip_level_number: u32,
    pub points: Points,
    pub next_level: String,
    pub points_to_next: Points,
}

impl StatusResponse {
    pub fn new(user_id: impl Into<String>, resolved: ResolvedTier) -> Self {
        Self {
            user_id: user_id.into(),
            vip_level: resolved.tier_name,
            vip_level_number: resolved.tier_level,
            points: resolved.points,
            next_level: resolved
                .next_tier_name
                .unwrap_or_else(|| MAX_TIER_SENTINEL.to_string()),
            points_to_next: resolved.points_to_next,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPointsResponse {
    pub user_id: String,
    pub old_level: u32,
    pub new_level: u32,
    pub new_level_name: String,
    pub total_points: Points,
    pub upgraded: bool,
}

impl From<UpgradeResult> for AddPointsResponse {
    fn from(result: UpgradeResult) -> Self {
        Self {
            user_id: result.user_id,
            old_level: result.old_level,
            new_level: result.new_level,
            new_level_name: result.new_level_name,
            total_points: result.new_points,
            upgraded: result.upgraded,
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// GET / - liveness marker.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "VIP API is running" }))
}

/// GET /vip/status?user_id=&points= - resolve a point total without touching users.
pub async fn status_query_handler(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;

    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| GUEST_USER_ID.to_string());
    let points = query.points.unwrap_or(0);

    let tiers = run_blocking(&state.store, |store| store.tiers()).await?;

    Ok(Json(StatusResponse::new(user_id, tiers.resolve(points))))
}

/// POST /vip/status - look up (or lazily create) a user and resolve its tier.
pub async fn status_handler(
    State(state): State<AppState>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let user_id = required_user_id(request.user_id)?;

    let lookup_id = user_id.clone();
    let (user, created, tiers) = run_blocking(&state.store, move |store| {
        let (user, created) = store.get_or_create_user(&lookup_id)?;
        let tiers = store.tiers()?;
        Ok((user, created, tiers))
    })
    .await?;

    if created {
        info!(user_id = %user_id, "created VIP user");
    }

    Ok(Json(StatusResponse::new(user_id, tiers.resolve(user.points))))
}

/// POST /vip/add-points - award points to an existing user.
pub async fn add_points_handler(
    State(state): State<AppState>,
    body: Result<Json<AddPointsRequest>, JsonRejection>,
) -> Result<Json<AddPointsResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

    let (Some(user_id), Some(points)) = (request.user_id, request.points) else {
        return Err(ApiError::Validation("user_id and points required".into()));
    };
    let user_id = required_user_id(Some(user_id))?;
    let delta = positive_points(&points)?;

    let award_id = user_id.clone();
    let result = run_blocking(&state.store, move |store| store.award_points(&award_id, delta)).await?;

    if result.upgraded {
        info!(
            user_id = %user_id,
            old_level = result.old_level,
            new_level = result.new_level,
            "VIP upgrade"
        );
    } else {
        debug!(user_id = %user_id, total_points = result.new_points, "points awarded");
    }

    Ok(Json(AddPointsResponse::from(result)))
}

/// GET /vip/levels - the tier table, ascending by level.
pub async fn levels_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<TierDefinition>>, ApiError> {
    let tiers = run_blocking(&state.store, |store| store.tiers()).await?;
    Ok(Json(tiers.as_slice().to_vec()))
}

// =============================================================================
// HELPERS
// =============================================================================

fn required_user_id(user_id: Option<String>) -> Result<String, ApiError> {
    match user_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ApiError::Validation("user_id required".into())),
    }
}

/// Accept only integral JSON numbers greater than zero.
fn positive_points(points: &Number) -> Result<Points, ApiError> {
    match points.as_u64() {
        Some(delta) if delta > 0 => Ok(delta),
        _ => Err(ApiError::Validation(
            "points must be a positive integer".into(),
        )),
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<Points>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<Points>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid points value '{text}'"))),
    }
}

/// Run a store operation on the blocking pool.
async fn run_blocking<T, F>(store: &Arc<VipStore>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&VipStore) -> vip_core::Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "store task failed");
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
