//! # In-Memory Backend
//!
//! A process-local [`RecordStore`] and [`BlobStore`] used in development
//! mode and tests. It enforces the same guarantees as the hosted store:
//! point increments are atomic and `(user_id, milestone)` is unique.
//!
//! All state sits behind one `parking_lot::RwLock`. No lock is held across
//! an `.await`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use streetcred_core::milestone::MAX_POINTS;
use streetcred_core::{
    Badge, BadgeId, BadgePool, EarnedBadge, NewBadge, NewReport, PointsChange, Profile, Report,
    ReportId, UserBadge, UserId,
};

use crate::error::{BlobError, StoreError};
use crate::store::{AwardInsert, BlobStore, RecordStore};

/// Base of the URLs returned by [`MemoryStore::public_url`].
pub const MEMORY_BLOB_BASE: &str = "memory://report_images";

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<UserId, Profile>,
    badges: Vec<Badge>,
    awards: BTreeMap<(UserId, u32), UserBadge>,
    reports: Vec<Report>,
    next_report_id: ReportId,
    blobs: HashMap<String, StoredBlob>,
}

/// An uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Thread-safe, cloneable in-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a profile.
    pub fn upsert_profile(&self, user_id: UserId, username: Option<String>, points: u32) {
        let profile = Profile {
            user_id: user_id.clone(),
            username,
            points,
        };
        self.tables.write().profiles.insert(user_id, profile);
    }

    /// Add a catalog badge.
    pub fn add_badge(&self, badge: Badge) {
        self.tables.write().badges.push(badge);
    }

    /// Add catalog badges.
    pub fn add_badges(&self, badges: impl IntoIterator<Item = Badge>) {
        self.tables.write().badges.extend(badges);
    }

    /// The badge catalog in insertion order.
    pub fn badges(&self) -> Vec<Badge> {
        self.tables.read().badges.clone()
    }

    /// Every award row, ordered by user then milestone.
    pub fn awards(&self) -> Vec<UserBadge> {
        self.tables.read().awards.values().cloned().collect()
    }

    /// Fetch an uploaded object.
    pub fn blob(&self, path: &str) -> Option<StoredBlob> {
        self.tables.read().blobs.get(path).cloned()
    }

    /// Number of uploaded objects.
    pub fn blob_count(&self) -> usize {
        self.tables.read().blobs.len()
    }
}

fn newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

impl RecordStore for MemoryStore {
    async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().profiles.get(user_id).cloned())
    }

    async fn increment_points(
        &self,
        user_id: &UserId,
        delta: u32,
    ) -> Result<Option<PointsChange>, StoreError> {
        let mut tables = self.tables.write();
        let Some(profile) = tables.profiles.get_mut(user_id) else {
            return Ok(None);
        };
        let previous = profile.points;
        let new = previous
            .checked_add(delta)
            .filter(|total| *total <= MAX_POINTS)
            .ok_or_else(|| StoreError::OutOfRange {
                operation: "increment_points",
                message: format!("points total {previous} + {delta} exceeds {MAX_POINTS}"),
            })?;
        profile.points = new;
        Ok(Some(PointsChange::new(previous, new)))
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<Profile>, StoreError> {
        let mut profiles: Vec<Profile> = self.tables.read().profiles.values().cloned().collect();
        profiles.sort_by(|a, b| b.points.cmp(&a.points).then(a.user_id.cmp(&b.user_id)));
        profiles.truncate(limit as usize);
        Ok(profiles)
    }

    async fn awarded_milestones(&self, user_id: &UserId) -> Result<BTreeSet<u32>, StoreError> {
        Ok(self
            .tables
            .read()
            .awards
            .keys()
            .filter(|(u, _)| u == user_id)
            .map(|(_, m)| *m)
            .collect())
    }

    async fn badge_pool(&self, pool: &BadgePool) -> Result<Vec<Badge>, StoreError> {
        Ok(self
            .tables
            .read()
            .badges
            .iter()
            .filter(|b| pool.admits(&b.location_name))
            .cloned()
            .collect())
    }

    async fn insert_badge(&self, badge: &NewBadge) -> Result<Badge, StoreError> {
        let mut tables = self.tables.write();
        let id = tables.badges.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let stored = badge.clone().into_badge(id);
        tables.badges.push(stored.clone());
        Ok(stored)
    }

    async fn insert_award(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        milestone: u32,
    ) -> Result<AwardInsert, StoreError> {
        let mut tables = self.tables.write();
        let key = (user_id.clone(), milestone);
        if tables.awards.contains_key(&key) {
            return Ok(AwardInsert::AlreadyAwarded);
        }
        let row = UserBadge {
            user_id: user_id.clone(),
            badge_id,
            milestone,
            earned_at: Utc::now(),
        };
        tables.awards.insert(key, row.clone());
        Ok(AwardInsert::Inserted(row))
    }

    async fn replace_award(
        &self,
        user_id: &UserId,
        milestone: u32,
        badge_id: BadgeId,
    ) -> Result<Option<UserBadge>, StoreError> {
        let mut tables = self.tables.write();
        Ok(tables
            .awards
            .get_mut(&(user_id.clone(), milestone))
            .map(|row| {
                row.badge_id = badge_id;
                row.clone()
            }))
    }

    async fn user_badges(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .awards
            .values()
            .filter(|row| &row.user_id == user_id)
            .map(|row| {
                let badge = tables.badges.iter().find(|b| b.id == row.badge_id).cloned();
                EarnedBadge::join(row.clone(), badge)
            })
            .collect())
    }

    async fn insert_report(&self, report: &NewReport) -> Result<Report, StoreError> {
        let mut tables = self.tables.write();
        tables.next_report_id += 1;
        let stored = report.clone().into_report(tables.next_report_id, Utc::now());
        tables.reports.push(stored.clone());
        Ok(stored)
    }

    async fn reports_by_user(&self, user_id: &UserId) -> Result<Vec<Report>, StoreError> {
        let mut reports: Vec<Report> = self
            .tables
            .read()
            .reports
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut reports);
        Ok(reports)
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<Report>, StoreError> {
        let mut reports = self.tables.read().reports.clone();
        newest_first(&mut reports);
        reports.truncate(limit as usize);
        Ok(reports)
    }

    async fn all_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(self.tables.read().reports.clone())
    }
}

impl BlobStore for MemoryStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        let mut tables = self.tables.write();
        if tables.blobs.contains_key(path) {
            return Err(BlobError::Rejected {
                path: path.to_string(),
                message: "object already exists".to_string(),
            });
        }
        tables.blobs.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{MEMORY_BLOB_BASE}/{path}")
    }
}
