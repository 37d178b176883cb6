//! # Report Service
//!
//! Submission, listing and proximity search. Submitting a report awards
//! one point through the [`RewardEngine`]. Image upload is best-effort: a
//! decode or upload failure is logged and the report is stored without an
//! image.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use streetcred_core::geo::validate_radius;
use streetcred_core::report::within_radius;
use streetcred_core::{
    BadgeAward, Coordinates, ImageExtension, ImagePayload, NearbyReport, NewReport, Report, UserId,
};
use uuid::Uuid;

use crate::classifier::LocationClassifier;
use crate::engine::RewardEngine;
use crate::error::RewardError;
use crate::store::{BlobStore, RecordStore};

/// Points awarded per submitted report.
pub const REPORT_POINTS: u32 = 1;

/// How an attached image was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Base64 text, optionally a `data:` URL.
    Base64(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

/// An image attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub source: ImageSource,
    pub extension: ImageExtension,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedReport {
    pub report: Report,
    pub points_awarded: u32,
    pub new_points: u32,
    pub previous_points: u32,
    pub new_badges: Vec<BadgeAward>,
    pub total_badges: usize,
    pub next_milestone: u32,
}

/// Reports backed by a record store, a blob store and the reward engine.
#[derive(Debug)]
pub struct ReportService<S, B, C> {
    engine: Arc<RewardEngine<S, C>>,
    blobs: B,
}

impl<S, B, C> ReportService<S, B, C>
where
    S: RecordStore,
    B: BlobStore,
    C: LocationClassifier,
{
    pub fn new(engine: Arc<RewardEngine<S, C>>, blobs: B) -> Self {
        Self { engine, blobs }
    }

    pub fn engine(&self) -> &Arc<RewardEngine<S, C>> {
        &self.engine
    }

    /// Store a report, then award [`REPORT_POINTS`] at its coordinates.
    ///
    /// Any `image_url` already on `report` is replaced by the upload result.
    pub async fn submit(
        &self,
        mut report: NewReport,
        image: Option<ImageUpload>,
    ) -> Result<SubmittedReport, RewardError> {
        report.image_url = match image {
            Some(image) => self.upload_best_effort(&report.user_id, image).await,
            None => None,
        };

        let stored = self.engine.store().insert_report(&report).await?;
        tracing::info!(user_id = %stored.user_id, report_id = stored.id, "report stored");

        let update = self
            .engine
            .add_points(&report.user_id, REPORT_POINTS, &report.at)
            .await?;

        Ok(SubmittedReport {
            report: stored,
            points_awarded: REPORT_POINTS,
            new_points: update.change.new_points,
            previous_points: update.change.previous_points,
            new_badges: update.check.new_badges,
            total_badges: update.check.total_badges,
            next_milestone: update.check.next_milestone,
        })
    }

    async fn upload_best_effort(&self, user_id: &UserId, image: ImageUpload) -> Option<String> {
        let decoded = match image.source {
            ImageSource::Base64(text) => ImagePayload::from_base64(&text, image.extension),
            ImageSource::Bytes(bytes) => ImagePayload::from_bytes(bytes, image.extension),
        };
        let payload = match decoded {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "discarding undecodable report image");
                return None;
            }
        };

        let path = payload.object_path(user_id, Utc::now(), Uuid::new_v4());
        let content_type = payload.content_type();
        match self
            .blobs
            .upload(&path, payload.into_bytes(), &content_type)
            .await
        {
            Ok(()) => Some(self.blobs.public_url(&path)),
            Err(e) => {
                tracing::warn!(user_id = %user_id, path = %path, error = %e, "report image upload failed");
                None
            }
        }
    }

    /// The user's reports, newest first.
    pub async fn by_user(&self, user_id: &UserId) -> Result<Vec<Report>, RewardError> {
        Ok(self.engine.store().reports_by_user(user_id).await?)
    }

    /// Latest reports across users.
    pub async fn recent(&self, limit: u32) -> Result<Vec<Report>, RewardError> {
        Ok(self.engine.store().recent_reports(limit).await?)
    }

    /// Reports within `radius_km` of `center`, nearest first.
    ///
    /// Fails with [`RewardError::Invalid`] unless `radius_km` is finite and
    /// positive.
    pub async fn nearby(
        &self,
        center: &Coordinates,
        radius_km: f64,
    ) -> Result<Vec<NearbyReport>, RewardError> {
        let radius_km = validate_radius(radius_km)?;
        let all = self.engine.store().all_reports().await?;
        Ok(within_radius(all, center, radius_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FixedClassifier;
    use crate::memory::{MemoryStore, MEMORY_BLOB_BASE};
    use streetcred_core::Badge;

    type Service = ReportService<MemoryStore, MemoryStore, FixedClassifier>;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn service(points: u32) -> (MemoryStore, Service) {
        let store = MemoryStore::new();
        store.upsert_profile(user("a"), None, points);
        store.add_badge(Badge {
            id: 1,
            animal: "Pigeon".into(),
            location_name: "Union Square".into(),
            image_url: None,
        });
        let engine = Arc::new(RewardEngine::with_seed(
            store.clone(),
            FixedClassifier::new("Union Square"),
            3,
        ));
        (store.clone(), ReportService::new(engine, store))
    }

    fn new_report(lat: f64, lon: f64, description: &str) -> NewReport {
        NewReport::new(
            user("a"),
            Coordinates::new(lat, lon).unwrap(),
            description,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn submit_without_image_awards_one_point() {
        let (_, svc) = service(0);
        let out = svc
            .submit(new_report(40.7362, -73.9915, "leak near corner"), None)
            .await
            .unwrap();
        assert_eq!(out.report.image_url, None);
        assert_eq!(out.report.description, "leak near corner");
        assert_eq!(out.points_awarded, 1);
        assert_eq!((out.previous_points, out.new_points), (0, 1));
        assert!(out.new_badges.is_empty());
        assert_eq!(out.next_milestone, 5);
    }

    #[tokio::test]
    async fn crossing_a_milestone_awards_exactly_one_badge() {
        let (_, svc) = service(4);
        let out = svc
            .submit(new_report(40.7362, -73.9915, "leak near corner"), None)
            .await
            .unwrap();
        assert_eq!(out.new_points, 5);
        assert_eq!(out.new_badges.len(), 1);
        assert_eq!(out.new_badges[0].milestone, 5);
        assert_eq!(out.total_badges, 1);
    }

    #[tokio::test]
    async fn image_is_uploaded_under_user_prefix() {
        let (store, svc) = service(0);
        let image = ImageUpload {
            source: ImageSource::Base64("data:image/png;base64,aGVsbG8=".into()),
            extension: ImageExtension::new("png").unwrap(),
        };
        let out = svc
            .submit(new_report(0.0, 0.0, "graffiti"), Some(image))
            .await
            .unwrap();
        let url = out.report.image_url.unwrap();
        let prefix = format!("{MEMORY_BLOB_BASE}/a/");
        assert!(url.starts_with(&prefix), "{url}");
        assert!(url.ends_with(".png"));
        let blob = store.blob(&url[MEMORY_BLOB_BASE.len() + 1..]).unwrap();
        assert_eq!(blob.bytes, b"hello");
        assert_eq!(blob.content_type, "image/png");
    }

    #[tokio::test]
    async fn undecodable_image_is_dropped_not_fatal() {
        let (store, svc) = service(0);
        let image = ImageUpload {
            source: ImageSource::Base64("%%%".into()),
            extension: ImageExtension::default(),
        };
        let out = svc
            .submit(new_report(0.0, 0.0, "broken light"), Some(image))
            .await
            .unwrap();
        assert_eq!(out.report.image_url, None);
        assert_eq!(out.new_points, 1);
        assert_eq!(store.blob_count(), 0);
    }

    #[tokio::test]
    async fn raw_bytes_are_uploaded() {
        let (store, svc) = service(0);
        let image = ImageUpload {
            source: ImageSource::Bytes(vec![0xFF, 0xD8, 0xFF]),
            extension: ImageExtension::default(),
        };
        let out = svc
            .submit(new_report(0.0, 0.0, "pothole"), Some(image))
            .await
            .unwrap();
        assert!(out.report.image_url.unwrap().ends_with(".jpg"));
        assert_eq!(store.blob_count(), 1);
    }

    #[tokio::test]
    async fn unknown_user_fails_after_insert() {
        let (store, svc) = service(0);
        let report = NewReport::new(
            user("ghost"),
            Coordinates::new(0.0, 0.0).unwrap(),
            "orphan",
            None,
        )
        .unwrap();
        let err = svc.submit(report, None).await.unwrap_err();
        assert!(matches!(err, RewardError::UnknownUser(_)));
        assert_eq!(store.all_reports().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn nearby_keeps_only_reports_in_radius() {
        let (_, svc) = service(0);
        svc.submit(new_report(0.0, 0.0, "here"), None).await.unwrap();
        svc.submit(new_report(0.0, 1.0, "far"), None).await.unwrap();
        let center = Coordinates::new(0.0, 0.0).unwrap();
        let hits = svc.nearby(&center, 1.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].report.description, "here");
        assert_eq!(hits[0].distance_km, 0.0);
    }

    #[tokio::test]
    async fn nearby_rejects_invalid_radius() {
        let (_, svc) = service(0);
        svc.submit(new_report(0.0, 0.0, "here"), None).await.unwrap();
        let center = Coordinates::new(0.0, 0.0).unwrap();
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = svc.nearby(&center, radius).await.unwrap_err();
            assert!(matches!(
                err,
                RewardError::Invalid(streetcred_core::ValidationError::InvalidRadius(_))
            ));
        }
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let (_, svc) = service(0);
        for d in ["first", "second", "third"] {
            svc.submit(new_report(0.0, 0.0, d), None).await.unwrap();
        }
        let mine: Vec<String> = svc
            .by_user(&user("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.description)
            .collect();
        assert_eq!(mine, vec!["third", "second", "first"]);
        assert_eq!(svc.recent(2).await.unwrap().len(), 2);
    }
}
