//! # Reports
//!
//! A report is a geotagged observation submitted by a user. Reports are
//! immutable once stored; proximity search is a full scan filtered by
//! haversine distance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geo::{round_km, Coordinates};
use crate::identity::UserId;

/// Store-assigned report identifier.
pub type ReportId = i64;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// A stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A report ready for insertion. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReport {
    pub user_id: UserId,
    /// Serialized as top-level `lat` / `lon`.
    #[serde(flatten)]
    pub at: Coordinates,
    pub description: String,
    pub image_url: Option<String>,
}

impl NewReport {
    /// Build a report from validated parts.
    pub fn new(
        user_id: UserId,
        at: Coordinates,
        description: &str,
        image_url: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            user_id,
            at,
            description: validate_description(description)?,
            image_url,
        })
    }

    /// Materialize as a stored report.
    pub fn into_report(self, id: ReportId, created_at: DateTime<Utc>) -> Report {
        Report {
            id,
            user_id: self.user_id,
            lat: self.at.lat(),
            lon: self.at.lon(),
            description: self.description,
            image_url: self.image_url,
            created_at,
        }
    }
}

/// Reject blank or oversized descriptions. The text is stored as given.
pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(description.to_string())
}

/// A report annotated with its distance from a query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyReport {
    #[serde(flatten)]
    pub report: Report,
    /// Kilometers, rounded to two decimals.
    pub distance_km: f64,
}

/// Reports within `radius_km` of `center`, nearest first.
///
/// The radius test and the ordering use the exact distance; only the
/// reported `distance_km` is rounded.
pub fn within_radius(
    reports: impl IntoIterator<Item = Report>,
    center: &Coordinates,
    radius_km: f64,
) -> Vec<NearbyReport> {
    let mut hits: Vec<(f64, Report)> = reports
        .into_iter()
        .map(|r| (center.distance_to(r.lat, r.lon), r))
        .filter(|(d, _)| *d <= radius_km)
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    hits.into_iter()
        .map(|(d, report)| NearbyReport {
            report,
            distance_km: round_km(d),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: ReportId, lat: f64, lon: f64) -> Report {
        Report {
            id,
            user_id: UserId::new("u1").unwrap(),
            lat,
            lon,
            description: format!("report {id}"),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn equator_example_keeps_only_origin() {
        let center = Coordinates::new(0.0, 0.0).unwrap();
        let hits = within_radius(vec![report(1, 0.0, 0.0), report(2, 0.0, 1.0)], &center, 1.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].report.id, 1);
        assert_eq!(hits[0].distance_km, 0.0);
    }

    #[test]
    fn sorted_nearest_first() {
        let center = Coordinates::new(40.7585, -73.9858).unwrap();
        let hits = within_radius(
            vec![
                report(1, 40.7640, -73.9858),
                report(2, 40.7585, -73.9858),
                report(3, 40.7600, -73.9858),
            ],
            &center,
            5.0,
        );
        let ids: Vec<ReportId> = hits.iter().map(|h| h.report.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn boundary_is_inclusive() {
        let center = Coordinates::new(0.0, 0.0).unwrap();
        let exact = center.distance_to(0.0, 1.0);
        let hits = within_radius(vec![report(1, 0.0, 1.0)], &center, exact);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn nearby_report_flattens_fields() {
        let center = Coordinates::new(0.0, 0.0).unwrap();
        let hits = within_radius(vec![report(9, 0.0, 0.001)], &center, 1.0);
        let json = serde_json::to_value(&hits[0]).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["distance_km"], 0.11);
        assert!(json.get("report").is_none());
    }

    #[test]
    fn description_rules() {
        assert_eq!(
            validate_description("   "),
            Err(ValidationError::EmptyDescription)
        );
        assert_eq!(
            validate_description("leak near corner").as_deref(),
            Ok("leak near corner")
        );
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(matches!(
            validate_description(&long),
            Err(ValidationError::DescriptionTooLong { .. })
        ));
    }

    #[test]
    fn new_report_carries_coordinates() {
        let at = Coordinates::new(40.7, -73.9).unwrap();
        let new = NewReport::new(UserId::new("u1").unwrap(), at, "pothole", None).unwrap();
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["lat"], 40.7);
        assert_eq!(json["lon"], -73.9);
        let stored = new.into_report(4, Utc::now());
        assert_eq!(stored.id, 4);
        assert!(stored.image_url.is_none());
    }
}
