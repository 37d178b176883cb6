//! # Reward Engine
//!
//! Awards one badge per earned-but-unawarded milestone.
//!
//! ## Algorithm
//!
//! 1. Earned milestones for the point total: `{5, 10, …, 5 * floor(p / 5)}`.
//! 2. Milestones already awarded, from the record store.
//! 3. Missing = earned − awarded. If empty, stop here (no classifier call).
//! 4. Classify the coordinates to a location name and derive the
//!    [`BadgePool`] once for the whole attempt.
//! 5. For each missing milestone, draw one badge uniformly at random and
//!    insert the award. An empty pool skips the milestone; a uniqueness
//!    conflict counts as already awarded.
//!
//! ## Concurrency
//!
//! Checks for the same user run one at a time under a per-user async lock.
//! [`RewardEngine::add_points`] holds that lock across the increment and the
//! check, so its award pass always sees the total it produced. The store's
//! unique `(user_id, milestone)` constraint covers other processes.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use streetcred_core::badge::pick_badge;
use streetcred_core::milestone::{earned_milestones, missing_milestones, next_milestone};
use streetcred_core::{
    Badge, BadgeAward, BadgePool, BadgeProgress, Coordinates, EarnedBadge, PointsChange, Profile,
    UserId,
};

use crate::classifier::LocationClassifier;
use crate::error::RewardError;
use crate::locks::UserLocks;
use crate::store::{AwardInsert, RecordStore};

/// Outcome of a milestone check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneCheck {
    pub new_badges: Vec<BadgeAward>,
    /// Awards held by the user after the check.
    pub total_badges: usize,
    pub next_milestone: u32,
}

/// Outcome of a point update: the increment plus the milestone check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsUpdate {
    pub user_id: UserId,
    #[serde(flatten)]
    pub change: PointsChange,
    #[serde(flatten)]
    pub check: MilestoneCheck,
}

/// Outcome of rewriting an existing award.
#[derive(Debug, Clone, PartialEq)]
pub enum Reassignment {
    /// The award now points at `badge`.
    Updated { milestone: u32, badge: Badge },
    /// The location has no eligible badges.
    NoBadges { milestone: u32, location: String },
    /// The user holds no award for the milestone.
    NoAward { milestone: u32 },
}

/// Milestone badge awards over a record store and a location classifier.
#[derive(Debug)]
pub struct RewardEngine<S, C> {
    store: S,
    classifier: C,
    rng: Arc<Mutex<StdRng>>,
    locks: UserLocks,
}

impl<S: RecordStore, C: LocationClassifier> RewardEngine<S, C> {
    /// Engine drawing badges from OS entropy.
    pub fn new(store: S, classifier: C) -> Self {
        Self::with_rng(store, classifier, StdRng::from_entropy())
    }

    /// Engine drawing badges from a seeded generator.
    pub fn with_seed(store: S, classifier: C, seed: u64) -> Self {
        Self::with_rng(store, classifier, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(store: S, classifier: C, rng: StdRng) -> Self {
        Self {
            store,
            classifier,
            rng: Arc::new(Mutex::new(rng)),
            locks: UserLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Award badges for every earned milestone that lacks one.
    ///
    /// Idempotent: a second call with the same total awards nothing.
    pub async fn check_milestones(
        &self,
        user_id: &UserId,
        points: u32,
        at: &Coordinates,
    ) -> Result<MilestoneCheck, RewardError> {
        let _guard = self.locks.acquire(user_id).await;
        self.award_locked(user_id, points, at).await
    }

    /// Atomically add `delta` points, then award any milestones reached.
    ///
    /// Fails with [`RewardError::UnknownUser`] when the user has no profile.
    /// If the award pass fails after the increment, the points stay
    /// committed and the error is returned; a later check backfills.
    pub async fn add_points(
        &self,
        user_id: &UserId,
        delta: u32,
        at: &Coordinates,
    ) -> Result<PointsUpdate, RewardError> {
        let _guard = self.locks.acquire(user_id).await;
        let change = self
            .store
            .increment_points(user_id, delta)
            .await?
            .ok_or_else(|| RewardError::UnknownUser(user_id.clone()))?;

        let check = match self.award_locked(user_id, change.new_points, at).await {
            Ok(check) => check,
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    new_points = change.new_points,
                    error = %e,
                    "points committed but badge award failed"
                );
                return Err(e);
            }
        };

        Ok(PointsUpdate {
            user_id: user_id.clone(),
            change,
            check,
        })
    }

    async fn award_locked(
        &self,
        user_id: &UserId,
        points: u32,
        at: &Coordinates,
    ) -> Result<MilestoneCheck, RewardError> {
        let earned = earned_milestones(points);
        let awarded = self.store.awarded_milestones(user_id).await?;
        let missing = missing_milestones(&earned, &awarded);

        let next = next_milestone(points);
        if missing.is_empty() {
            return Ok(MilestoneCheck {
                new_badges: Vec::new(),
                total_badges: awarded.len(),
                next_milestone: next,
            });
        }

        let location = self.classifier.classify(at).await?;
        let pool_kind = BadgePool::for_location(&location);
        let pool = self.store.badge_pool(&pool_kind).await?;
        if pool.is_empty() {
            tracing::info!(
                user_id = %user_id,
                location = %location,
                skipped = missing.len(),
                "no badges for location, milestones left unawarded"
            );
        }

        let mut new_badges = Vec::new();
        let mut conflicts = 0usize;
        for milestone in missing {
            let Some(badge) = self.draw(&pool) else {
                continue;
            };
            match self.store.insert_award(user_id, badge.id, milestone).await? {
                AwardInsert::Inserted(row) => new_badges.push(BadgeAward {
                    milestone,
                    badge,
                    awarded_at: row.earned_at,
                }),
                AwardInsert::AlreadyAwarded => {
                    tracing::debug!(user_id = %user_id, milestone, "milestone awarded concurrently");
                    conflicts += 1;
                }
            }
        }

        if !new_badges.is_empty() {
            tracing::info!(
                user_id = %user_id,
                location = %location,
                awarded = new_badges.len(),
                "badges awarded"
            );
        }

        Ok(MilestoneCheck {
            total_badges: awarded.len() + new_badges.len() + conflicts,
            new_badges,
            next_milestone: next,
        })
    }

    fn draw(&self, pool: &[Badge]) -> Option<Badge> {
        let mut rng = self.rng.lock();
        pick_badge(pool, &mut *rng).cloned()
    }

    /// The user's awards joined with the catalog, by milestone.
    pub async fn user_badges(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, RewardError> {
        Ok(self.store.user_badges(user_id).await?)
    }

    /// Progress toward the next badge from stored points and awards.
    pub async fn progress(&self, user_id: &UserId) -> Result<BadgeProgress, RewardError> {
        let profile = self
            .store
            .profile(user_id)
            .await?
            .ok_or_else(|| RewardError::UnknownUser(user_id.clone()))?;
        let awarded = self.store.awarded_milestones(user_id).await?;
        Ok(BadgeProgress::compute(profile.points, awarded.len()))
    }

    /// Top profiles by points.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<Profile>, RewardError> {
        Ok(self.store.leaderboard(limit).await?)
    }

    /// Replace the badge on an existing award with a random badge from
    /// `location`'s pool.
    pub async fn reassign(
        &self,
        user_id: &UserId,
        milestone: u32,
        location: &str,
    ) -> Result<Reassignment, RewardError> {
        let _guard = self.locks.acquire(user_id).await;
        let pool = self
            .store
            .badge_pool(&BadgePool::for_location(location))
            .await?;
        let Some(badge) = self.draw(&pool) else {
            return Ok(Reassignment::NoBadges {
                milestone,
                location: location.to_string(),
            });
        };
        match self.store.replace_award(user_id, milestone, badge.id).await? {
            Some(_) => Ok(Reassignment::Updated { milestone, badge }),
            None => Ok(Reassignment::NoAward { milestone }),
        }
    }
}
