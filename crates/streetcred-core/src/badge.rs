//! # Badge Catalog & Award Records
//!
//! Badges are static catalog entries tagged with a location name. A user
//! earns at most one badge per milestone; the pool a badge is drawn from is
//! decided by [`BadgePool::for_location`].

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Catalog identifier of a badge.
pub type BadgeId = i64;

/// Sponsor locations. A classification landing on any of these draws from
/// the combined sponsor pool instead of a neighborhood pool.
pub const SPONSOR_LOCATIONS: [&str; 6] = [
    "Columbia University",
    "Capital One",
    "An Ai World",
    "BlackRock",
    "Comet Opik",
    "Echo Merit Systems",
];

/// Whether `name` is one of [`SPONSOR_LOCATIONS`] (exact match).
pub fn is_sponsor_location(name: &str) -> bool {
    SPONSOR_LOCATIONS.contains(&name)
}

/// A catalog badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub animal: String,
    pub location_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A catalog entry before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBadge {
    pub animal: String,
    pub location_name: String,
    pub image_url: Option<String>,
}

impl NewBadge {
    pub fn into_badge(self, id: BadgeId) -> Badge {
        Badge {
            id,
            animal: self.animal,
            location_name: self.location_name,
            image_url: self.image_url,
        }
    }
}

/// A stored award row: one per `(user_id, milestone)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub milestone: u32,
    pub earned_at: DateTime<Utc>,
}

/// An award row joined with its catalog badge, as returned for display.
///
/// The joined badge serializes under the key `badges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub milestone: u32,
    pub earned_at: DateTime<Utc>,
    #[serde(rename = "badges", default)]
    pub badge: Option<Badge>,
}

impl EarnedBadge {
    /// Join an award row with its catalog entry.
    pub fn join(award: UserBadge, badge: Option<Badge>) -> Self {
        Self {
            user_id: award.user_id,
            badge_id: award.badge_id,
            milestone: award.milestone,
            earned_at: award.earned_at,
            badge,
        }
    }
}

/// A badge newly awarded by a milestone check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub milestone: u32,
    pub badge: Badge,
    pub awarded_at: DateTime<Utc>,
}

/// The set of catalog badges eligible for a classified location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgePool {
    /// Union of every sponsor location's badges.
    Sponsors,
    /// Badges tagged with exactly this neighborhood, sponsor tags excluded.
    Neighborhood(String),
}

impl BadgePool {
    /// Pool for a classifier result.
    pub fn for_location(location_name: &str) -> Self {
        if is_sponsor_location(location_name) {
            Self::Sponsors
        } else {
            Self::Neighborhood(location_name.to_string())
        }
    }

    /// Whether a badge tagged `location_name` belongs to this pool.
    pub fn admits(&self, location_name: &str) -> bool {
        match self {
            Self::Sponsors => is_sponsor_location(location_name),
            Self::Neighborhood(name) => {
                name == location_name && !is_sponsor_location(location_name)
            }
        }
    }
}

/// Pick one badge uniformly at random. `None` for an empty pool.
pub fn pick_badge<'a, R: Rng + ?Sized>(pool: &'a [Badge], rng: &mut R) -> Option<&'a Badge> {
    pool.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn badge(id: BadgeId, location: &str) -> Badge {
        Badge {
            id,
            animal: format!("animal-{id}"),
            location_name: location.to_string(),
            image_url: None,
        }
    }

    #[test]
    fn sponsor_names_select_sponsor_pool() {
        for name in SPONSOR_LOCATIONS {
            assert_eq!(BadgePool::for_location(name), BadgePool::Sponsors);
        }
    }

    #[test]
    fn neighborhood_pool_is_exact_match() {
        let pool = BadgePool::for_location("Harlem");
        assert!(pool.admits("Harlem"));
        assert!(!pool.admits("East Harlem"));
        assert!(!pool.admits("harlem"));
    }

    #[test]
    fn sponsor_pool_admits_only_sponsors() {
        let pool = BadgePool::Sponsors;
        assert!(pool.admits("BlackRock"));
        assert!(pool.admits("Columbia University"));
        assert!(!pool.admits("Midtown"));
    }

    #[test]
    fn neighborhood_named_like_sponsor_is_excluded() {
        // A hand-built neighborhood pool never admits sponsor-tagged badges.
        let pool = BadgePool::Neighborhood("Capital One".into());
        assert!(!pool.admits("Capital One"));
    }

    #[test]
    fn pick_from_empty_pool_is_none() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_badge(&[], &mut rng).is_none());
    }

    #[test]
    fn pick_is_deterministic_for_a_seed() {
        let pool: Vec<Badge> = (1..=10).map(|id| badge(id, "SoHo")).collect();
        let a = pick_badge(&pool, &mut StdRng::seed_from_u64(42)).map(|b| b.id);
        let b = pick_badge(&pool, &mut StdRng::seed_from_u64(42)).map(|b| b.id);
        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn earned_badge_serializes_join_under_badges_key() {
        let earned = EarnedBadge::join(
            UserBadge {
                user_id: UserId::new("u1").unwrap(),
                badge_id: 3,
                milestone: 5,
                earned_at: "2025-01-01T00:00:00Z".parse().unwrap(),
            },
            Some(badge(3, "Tribeca")),
        );
        let json = serde_json::to_value(&earned).unwrap();
        assert_eq!(json["badges"]["location_name"], "Tribeca");
        assert_eq!(json["milestone"], 5);
        assert!(json.get("badge").is_none());
    }

    #[test]
    fn badge_tolerates_missing_image_and_extra_columns() {
        let b: Badge = serde_json::from_str(
            r#"{"id": 1, "animal": "Pigeon", "location_name": "SoHo", "created_at": "x"}"#,
        )
        .unwrap();
        assert_eq!(b.image_url, None);
    }
}
