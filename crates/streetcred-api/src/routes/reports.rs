//! # Report Endpoints
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/api/reports/submit` | `submit_report` |
//! | `GET` | `/api/reports/user/:user_id` | `user_reports` |
//! | `GET` | `/api/reports/recent` | `recent_reports` |
//! | `GET` | `/api/reports/nearby` | `nearby_reports` |
//!
//! Submissions may carry a base64 image, so the submit route accepts a
//! larger body than the rest of the API.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use streetcred_core::geo::validate_radius;
use streetcred_core::limit::{validate_limit, DEFAULT_RECENT_LIMIT, MAX_LIMIT};
use streetcred_core::{
    BadgeAward, Coordinates, ImageExtension, NearbyReport, NewReport, Report, UserId,
    ValidationError,
};
use streetcred_rewards::{ImageSource, ImageUpload, SubmittedReport};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, extract_validated_query, Validate};
use crate::state::AppState;

/// Body limit for report submissions.
pub const SUBMIT_BODY_LIMIT: usize = 10 * 1024 * 1024;

const DEFAULT_RADIUS_KM: f64 = 1.0;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReportRequest {
    pub user_id: String,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
    /// Base64 image data, optionally a `data:` URL. Empty means no image.
    #[serde(default)]
    pub image_base64: Option<String>,
    /// File extension for the image, default `jpg`.
    #[serde(default)]
    pub image_extension: Option<String>,
}

/// A validated [`SubmitReportRequest`].
#[derive(Debug)]
pub struct SubmitInput {
    pub report: NewReport,
    pub image: Option<ImageUpload>,
}

impl Validate for SubmitReportRequest {
    type Validated = SubmitInput;

    fn validate(self) -> Result<SubmitInput, ValidationError> {
        let user_id = UserId::new(&self.user_id)?;
        let at = Coordinates::new(self.lat, self.lon)?;
        let report = NewReport::new(user_id, at, &self.description, None)?;

        let extension = match self.image_extension.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => ImageExtension::new(raw)?,
            _ => ImageExtension::default(),
        };
        let image = self
            .image_base64
            .filter(|data| !data.trim().is_empty())
            .map(|data| ImageUpload {
                source: ImageSource::Base64(data),
                extension,
            });

        Ok(SubmitInput { report, image })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitReportResponse {
    #[schema(value_type = Object)]
    pub report: Report,
    pub points_awarded: u32,
    pub new_points: u32,
    pub previous_points: u32,
    #[schema(value_type = Vec<Object>)]
    pub new_badges: Vec<BadgeAward>,
    pub total_badges: usize,
    pub next_milestone: u32,
}

impl From<SubmittedReport> for SubmitReportResponse {
    fn from(s: SubmittedReport) -> Self {
        Self {
            report: s.report,
            points_awarded: s.points_awarded,
            new_points: s.new_points,
            previous_points: s.previous_points,
            new_badges: s.new_badges,
            total_badges: s.total_badges,
            next_milestone: s.next_milestone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserReportsResponse {
    pub user_id: String,
    pub total_reports: usize,
    #[schema(value_type = Vec<Object>)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyReportsResponse {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub total_reports: usize,
    /// Reports with `distance_km`, nearest first.
    #[schema(value_type = Vec<Object>)]
    pub reports: Vec<NearbyReport>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// 1..=100, default 20.
    pub limit: Option<i64>,
}

impl Validate for RecentQuery {
    type Validated = u32;

    fn validate(self) -> Result<u32, ValidationError> {
        validate_limit(self.limit, DEFAULT_RECENT_LIMIT, MAX_LIMIT)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    /// Search radius in kilometres, default 1.0.
    pub radius_km: Option<f64>,
}

impl Validate for NearbyQuery {
    type Validated = (Coordinates, f64);

    fn validate(self) -> Result<(Coordinates, f64), ValidationError> {
        let center = Coordinates::new(self.lat, self.lon)?;
        let radius = validate_radius(self.radius_km.unwrap_or(DEFAULT_RADIUS_KM))?;
        Ok((center, radius))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/reports/submit",
            post(submit_report).layer(DefaultBodyLimit::max(SUBMIT_BODY_LIMIT)),
        )
        .route("/api/reports/user/:user_id", get(user_reports))
        .route("/api/reports/recent", get(recent_reports))
        .route("/api/reports/nearby", get(nearby_reports))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/reports/submit — Store a report and award one point.
#[utoipa::path(
    post,
    path = "/api/reports/submit",
    request_body = SubmitReportRequest,
    responses(
        (status = 200, description = "Report stored and point awarded", body = SubmitReportResponse),
        (status = 404, description = "No profile for user", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 502, description = "Store or classifier failure", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
async fn submit_report(
    State(state): State<AppState>,
    body: Result<Json<SubmitReportRequest>, JsonRejection>,
) -> Result<Json<SubmitReportResponse>, AppError> {
    let input = extract_validated_json(body)?;
    let submitted = state.reports.submit(input.report, input.image).await?;
    if let Some(m) = &state.metrics {
        m.record_report();
        m.record_points(submitted.points_awarded, submitted.new_badges.len());
    }
    Ok(Json(submitted.into()))
}

/// GET /api/reports/user/:user_id — A user's reports, newest first.
#[utoipa::path(
    get,
    path = "/api/reports/user/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User reports", body = UserReportsResponse),
        (status = 422, description = "Invalid user id", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
async fn user_reports(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserReportsResponse>, AppError> {
    let user_id = UserId::new(&user_id)?;
    let reports = state.reports.by_user(&user_id).await?;
    Ok(Json(UserReportsResponse {
        user_id: user_id.to_string(),
        total_reports: reports.len(),
        reports,
    }))
}

/// GET /api/reports/recent — Latest reports across users.
#[utoipa::path(
    get,
    path = "/api/reports/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "JSON array of recent reports, newest first"),
        (status = 422, description = "Invalid limit", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
async fn recent_reports(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<Vec<Report>>, AppError> {
    let limit = extract_validated_query(query)?;
    Ok(Json(state.reports.recent(limit).await?))
}

/// GET /api/reports/nearby — Reports within a radius.
#[utoipa::path(
    get,
    path = "/api/reports/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Reports within the radius", body = NearbyReportsResponse),
        (status = 422, description = "Invalid coordinates or radius", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
async fn nearby_reports(
    State(state): State<AppState>,
    query: Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Json<NearbyReportsResponse>, AppError> {
    let (center, radius_km) = extract_validated_query(query)?;
    let started = std::time::Instant::now();
    let reports = state.reports.nearby(&center, radius_km).await?;
    tracing::debug!(
        matches = reports.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "nearby scan"
    );
    Ok(Json(NearbyReportsResponse {
        lat: center.lat(),
        lon: center.lon(),
        radius_km,
        total_reports: reports.len(),
        reports,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(extension: Option<&str>, image: Option<&str>) -> SubmitReportRequest {
        SubmitReportRequest {
            user_id: "alice".into(),
            lat: 40.73,
            lon: -73.99,
            description: "  broken hydrant  ".into(),
            image_base64: image.map(String::from),
            image_extension: extension.map(String::from),
        }
    }

    #[test]
    fn submit_trims_description() {
        let input = submit(None, None).validate().unwrap();
        assert_eq!(input.report.description, "broken hydrant");
        assert!(input.image.is_none());
    }

    #[test]
    fn empty_image_means_no_image() {
        assert!(submit(None, Some("   ")).validate().unwrap().image.is_none());
    }

    #[test]
    fn image_extension_defaults_to_jpg() {
        let image = submit(None, Some("aGVsbG8=")).validate().unwrap().image.unwrap();
        assert_eq!(image.extension.as_str(), "jpg");
    }

    #[test]
    fn bad_extension_rejected() {
        assert!(matches!(
            submit(Some("../png"), Some("aGVsbG8=")).validate(),
            Err(ValidationError::InvalidImageExtension(_))
        ));
    }

    #[test]
    fn blank_description_rejected() {
        let mut req = submit(None, None);
        req.description = " ".into();
        assert_eq!(req.validate().unwrap_err(), ValidationError::EmptyDescription);
    }

    #[test]
    fn nearby_defaults_radius() {
        let (center, radius) = NearbyQuery {
            lat: 1.0,
            lon: 2.0,
            radius_km: None,
        }
        .validate()
        .unwrap();
        assert_eq!(radius, 1.0);
        assert_eq!(center.lat(), 1.0);
    }

    #[test]
    fn nearby_rejects_non_positive_radius() {
        let query = NearbyQuery {
            lat: 0.0,
            lon: 0.0,
            radius_km: Some(0.0),
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn recent_limit_defaults_to_twenty() {
        assert_eq!(RecentQuery { limit: None }.validate().unwrap(), 20);
    }
}
