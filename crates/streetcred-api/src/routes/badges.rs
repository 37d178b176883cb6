//! # Badge Endpoints
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/api/badges/add-points` | `add_points` |
//! | `POST` | `/api/badges/check-milestones` | `check_milestones` |
//! | `GET` | `/api/badges/user-badges/:user_id` | `user_badges` |
//! | `GET` | `/api/badges/badge-progress/:user_id` | `badge_progress` |
//! | `GET` | `/api/badges/leaderboard` | `leaderboard` |

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use streetcred_core::limit::{validate_limit, DEFAULT_LEADERBOARD_LIMIT, MAX_LIMIT};
use streetcred_core::milestone::validate_points;
use streetcred_core::{
    BadgeAward, BadgeProgress, Coordinates, EarnedBadge, Profile, UserId, ValidationError,
};
use streetcred_rewards::{MilestoneCheck, PointsUpdate};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, extract_validated_query, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body shared by `add-points` and `check-milestones`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PointsRequest {
    pub user_id: String,
    /// Points to add (`add-points`) or the current total (`check-milestones`).
    pub points: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A validated [`PointsRequest`].
#[derive(Debug)]
pub struct PointsInput {
    pub user_id: UserId,
    pub points: u32,
    pub at: Coordinates,
}

impl Validate for PointsRequest {
    type Validated = PointsInput;

    fn validate(self) -> Result<PointsInput, ValidationError> {
        Ok(PointsInput {
            user_id: UserId::new(&self.user_id)?,
            points: validate_points(self.points)?,
            at: Coordinates::new(self.latitude, self.longitude)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddPointsResponse {
    pub user_id: String,
    pub previous_points: u32,
    pub new_points: u32,
    pub points_added: u32,
    #[schema(value_type = Vec<Object>)]
    pub new_badges: Vec<BadgeAward>,
    pub total_badges: usize,
    pub next_milestone: u32,
}

impl From<PointsUpdate> for AddPointsResponse {
    fn from(update: PointsUpdate) -> Self {
        Self {
            user_id: update.user_id.to_string(),
            previous_points: update.change.previous_points,
            new_points: update.change.new_points,
            points_added: update.change.points_added,
            new_badges: update.check.new_badges,
            total_badges: update.check.total_badges,
            next_milestone: update.check.next_milestone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MilestoneCheckResponse {
    #[schema(value_type = Vec<Object>)]
    pub new_badges: Vec<BadgeAward>,
    pub total_badges: usize,
    pub next_milestone: u32,
}

impl From<MilestoneCheck> for MilestoneCheckResponse {
    fn from(check: MilestoneCheck) -> Self {
        Self {
            new_badges: check.new_badges,
            total_badges: check.total_badges,
            next_milestone: check.next_milestone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserBadgesResponse {
    pub user_id: String,
    pub total_badges: usize,
    /// Award rows with the catalog badge under `badges`.
    #[schema(value_type = Vec<Object>)]
    pub badges: Vec<EarnedBadge>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeProgressResponse {
    pub user_id: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub progress: BadgeProgress,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub total: usize,
    /// `{user_id, username, points}` by points descending.
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<Profile>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// 1..=100, default 50.
    pub limit: Option<i64>,
}

impl Validate for LeaderboardQuery {
    type Validated = u32;

    fn validate(self) -> Result<u32, ValidationError> {
        validate_limit(self.limit, DEFAULT_LEADERBOARD_LIMIT, MAX_LIMIT)
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/badges/add-points", post(add_points))
        .route("/api/badges/check-milestones", post(check_milestones))
        .route("/api/badges/user-badges/:user_id", get(user_badges))
        .route("/api/badges/badge-progress/:user_id", get(badge_progress))
        .route("/api/badges/leaderboard", get(leaderboard))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/badges/add-points — Add points and award any milestones reached.
#[utoipa::path(
    post,
    path = "/api/badges/add-points",
    request_body = PointsRequest,
    responses(
        (status = 200, description = "Points added", body = AddPointsResponse),
        (status = 404, description = "No profile for user", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 502, description = "Store or classifier failure", body = crate::error::ErrorBody),
    ),
    tag = "badges"
)]
async fn add_points(
    State(state): State<AppState>,
    body: Result<Json<PointsRequest>, JsonRejection>,
) -> Result<Json<AddPointsResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let update = state
        .engine()
        .add_points(&req.user_id, req.points, &req.at)
        .await?;
    if let Some(m) = &state.metrics {
        m.record_points(update.change.points_added, update.check.new_badges.len());
    }
    Ok(Json(update.into()))
}

/// POST /api/badges/check-milestones — Backfill badges for a point total.
#[utoipa::path(
    post,
    path = "/api/badges/check-milestones",
    request_body = PointsRequest,
    responses(
        (status = 200, description = "Milestones checked", body = MilestoneCheckResponse),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 502, description = "Store or classifier failure", body = crate::error::ErrorBody),
    ),
    tag = "badges"
)]
async fn check_milestones(
    State(state): State<AppState>,
    body: Result<Json<PointsRequest>, JsonRejection>,
) -> Result<Json<MilestoneCheckResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let check = state
        .engine()
        .check_milestones(&req.user_id, req.points, &req.at)
        .await?;
    if let Some(m) = &state.metrics {
        m.record_points(0, check.new_badges.len());
    }
    Ok(Json(check.into()))
}

/// GET /api/badges/user-badges/:user_id — Badges held by a user.
#[utoipa::path(
    get,
    path = "/api/badges/user-badges/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User badges by milestone", body = UserBadgesResponse),
        (status = 422, description = "Invalid user id", body = crate::error::ErrorBody),
    ),
    tag = "badges"
)]
async fn user_badges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserBadgesResponse>, AppError> {
    let user_id = UserId::new(&user_id)?;
    let badges = state.engine().user_badges(&user_id).await?;
    Ok(Json(UserBadgesResponse {
        user_id: user_id.to_string(),
        total_badges: badges.len(),
        badges,
    }))
}

/// GET /api/badges/badge-progress/:user_id — Progress toward the next badge.
#[utoipa::path(
    get,
    path = "/api/badges/badge-progress/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Badge progress", body = BadgeProgressResponse),
        (status = 404, description = "No profile for user", body = crate::error::ErrorBody),
    ),
    tag = "badges"
)]
async fn badge_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<BadgeProgressResponse>, AppError> {
    let user_id = UserId::new(&user_id)?;
    let progress = state.engine().progress(&user_id).await?;
    Ok(Json(BadgeProgressResponse {
        user_id: user_id.to_string(),
        progress,
    }))
}

/// GET /api/badges/leaderboard — Top users by points.
#[utoipa::path(
    get,
    path = "/api/badges/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard", body = LeaderboardResponse),
        (status = 422, description = "Invalid limit", body = crate::error::ErrorBody),
    ),
    tag = "badges"
)]
async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let limit = extract_validated_query(query)?;
    let entries = state.engine().leaderboard(limit).await?;
    Ok(Json(LeaderboardResponse {
        total: entries.len(),
        entries,
    }))
}
