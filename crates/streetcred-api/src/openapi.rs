//! # OpenAPI Document Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Static bearer token. Set via the AUTH_TOKEN env var.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StreetCred API",
        version = "0.1.0",
        description = "Points, milestone badges and geotagged civic reports for New York City."
    ),
    paths(
        crate::routes::badges::add_points,
        crate::routes::badges::check_milestones,
        crate::routes::badges::user_badges,
        crate::routes::badges::badge_progress,
        crate::routes::badges::leaderboard,
        crate::routes::reports::submit_report,
        crate::routes::reports::user_reports,
        crate::routes::reports::recent_reports,
        crate::routes::reports::nearby_reports,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::badges::PointsRequest,
        crate::routes::badges::AddPointsResponse,
        crate::routes::badges::MilestoneCheckResponse,
        crate::routes::badges::UserBadgesResponse,
        crate::routes::badges::BadgeProgressResponse,
        crate::routes::badges::LeaderboardResponse,
        crate::routes::reports::SubmitReportRequest,
        crate::routes::reports::SubmitReportResponse,
        crate::routes::reports::UserReportsResponse,
        crate::routes::reports::NearbyReportsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "badges", description = "Points, milestone badges and leaderboard"),
        (name = "reports", description = "Report submission, listing and proximity search"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "StreetCred API");
    }

    #[test]
    fn document_has_badge_and_report_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/badges/add-points",
            "/api/badges/check-milestones",
            "/api/badges/user-badges/{user_id}",
            "/api/badges/badge-progress/{user_id}",
            "/api/badges/leaderboard",
            "/api/reports/submit",
            "/api/reports/user/{user_id}",
            "/api/reports/recent",
            "/api/reports/nearby",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn document_has_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
