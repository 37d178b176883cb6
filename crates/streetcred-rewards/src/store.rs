//! # Persistence Seams
//!
//! [`RecordStore`] covers the four tables (`profiles`, `badges`,
//! `user_badges`, `reports`); [`BlobStore`] covers report images
//! and badge artwork.
//!
//! Implementations must be `Send + Sync` and return `Send` futures so the
//! services can run inside axum handlers. Two guarantees are required of
//! every record store:
//!
//! - [`RecordStore::increment_points`] is a single atomic increment.
//! - [`RecordStore::insert_award`] honors uniqueness of
//!   `(user_id, milestone)` and reports a conflict as
//!   [`AwardInsert::AlreadyAwarded`] instead of an error.

use std::collections::BTreeSet;
use std::future::Future;

use streetcred_core::{
    Badge, BadgeId, BadgePool, EarnedBadge, NewBadge, NewReport, PointsChange, Profile, Report,
    UserBadge, UserId,
};

use crate::error::{BlobError, StoreError};

/// Result of an award insert.
#[derive(Debug, Clone, PartialEq)]
pub enum AwardInsert {
    /// The row was created.
    Inserted(UserBadge),
    /// A row for this `(user_id, milestone)` already exists.
    AlreadyAwarded,
}

/// Table-level operations over the hosted record store.
pub trait RecordStore: Send + Sync {
    /// Fetch a profile, `None` if the user has none.
    fn profile(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Profile>, StoreError>> + Send;

    /// Atomically add `delta` to the user's points. `None` for an unknown user.
    fn increment_points(
        &self,
        user_id: &UserId,
        delta: u32,
    ) -> impl Future<Output = Result<Option<PointsChange>, StoreError>> + Send;

    /// Top profiles by points, descending.
    fn leaderboard(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Profile>, StoreError>> + Send;

    /// Milestones that already carry an award for the user.
    fn awarded_milestones(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<BTreeSet<u32>, StoreError>> + Send;

    /// Catalog badges eligible for a pool.
    fn badge_pool(
        &self,
        pool: &BadgePool,
    ) -> impl Future<Output = Result<Vec<Badge>, StoreError>> + Send;

    /// Add a catalog badge; the store assigns `id`.
    fn insert_badge(
        &self,
        badge: &NewBadge,
    ) -> impl Future<Output = Result<Badge, StoreError>> + Send;

    /// Record an award for `(user_id, milestone)`.
    fn insert_award(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        milestone: u32,
    ) -> impl Future<Output = Result<AwardInsert, StoreError>> + Send;

    /// Point an existing award at a different badge. `None` if no award
    /// exists for the milestone.
    fn replace_award(
        &self,
        user_id: &UserId,
        milestone: u32,
        badge_id: BadgeId,
    ) -> impl Future<Output = Result<Option<UserBadge>, StoreError>> + Send;

    /// The user's awards joined with the catalog, ascending by milestone.
    fn user_badges(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<EarnedBadge>, StoreError>> + Send;

    /// Insert a report; the store assigns `id` and `created_at`.
    fn insert_report(
        &self,
        report: &NewReport,
    ) -> impl Future<Output = Result<Report, StoreError>> + Send;

    /// The user's reports, newest first.
    fn reports_by_user(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<Report>, StoreError>> + Send;

    /// Reports across all users, newest first.
    fn recent_reports(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Report>, StoreError>> + Send;

    /// Every stored report.
    fn all_reports(&self) -> impl Future<Output = Result<Vec<Report>, StoreError>> + Send;
}

/// Object storage for report images and badge artwork.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`.
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<(), BlobError>> + Send;

    /// Publicly reachable URL of an object.
    fn public_url(&self, path: &str) -> String;
}
