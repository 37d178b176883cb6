//! # Milestone Arithmetic
//!
//! A milestone is reached every [`MILESTONE_STEP`] points. A user holding
//! `p` points has earned exactly the milestones `{5, 10, …, 5 * floor(p / 5)}`
//! and the next one is `5 * (floor(p / 5) + 1)`.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ValidationError;

/// Points between consecutive badge milestones.
pub const MILESTONE_STEP: u32 = 5;

/// Largest point total the persistence layer can hold (Postgres `integer`).
pub const MAX_POINTS: u32 = i32::MAX as u32;

/// Validate a signed point value from a request.
pub fn validate_points(value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativePoints(value));
    }
    if value > i64::from(MAX_POINTS) {
        return Err(ValidationError::PointsOutOfRange {
            value,
            max: MAX_POINTS,
        });
    }
    Ok(value as u32)
}

/// Validate a milestone value supplied by an operator.
pub fn validate_milestone(value: i64) -> Result<u32, ValidationError> {
    let points = validate_points(value).map_err(|_| ValidationError::InvalidMilestone(value))?;
    if is_milestone(points) {
        Ok(points)
    } else {
        Err(ValidationError::InvalidMilestone(value))
    }
}

/// The next milestone strictly above `points`.
pub fn next_milestone(points: u32) -> u32 {
    (points / MILESTONE_STEP)
        .saturating_add(1)
        .saturating_mul(MILESTONE_STEP)
}

/// All milestones earned at `points`, ascending. Empty below the first step.
pub fn earned_milestones(points: u32) -> Vec<u32> {
    (1..=points / MILESTONE_STEP)
        .map(|i| i * MILESTONE_STEP)
        .collect()
}

/// Whether `value` is a positive multiple of [`MILESTONE_STEP`].
pub fn is_milestone(value: u32) -> bool {
    value > 0 && value % MILESTONE_STEP == 0
}

/// Earned milestones with no award yet, ascending.
pub fn missing_milestones(earned: &[u32], awarded: &BTreeSet<u32>) -> Vec<u32> {
    earned
        .iter()
        .copied()
        .filter(|m| !awarded.contains(m))
        .collect()
}

/// A user's progress toward the next badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeProgress {
    pub current_points: u32,
    pub total_badges: usize,
    pub milestones_reached: usize,
    pub next_milestone: u32,
    pub points_to_next_badge: u32,
    /// `(points % 5) / 5 * 100`: progress through the current band.
    pub progress_percent: f64,
}

impl BadgeProgress {
    /// Compute progress from a point total and the number of badges held.
    pub fn compute(points: u32, total_badges: usize) -> Self {
        let next = next_milestone(points);
        Self {
            current_points: points,
            total_badges,
            milestones_reached: (points / MILESTONE_STEP) as usize,
            next_milestone: next,
            points_to_next_badge: next - points,
            progress_percent: f64::from(points % MILESTONE_STEP) / f64::from(MILESTONE_STEP) * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_milestones_below_five() {
        for p in 0..5 {
            assert!(earned_milestones(p).is_empty());
        }
    }

    #[test]
    fn twelve_points_earns_five_and_ten() {
        assert_eq!(earned_milestones(12), vec![5, 10]);
        assert_eq!(next_milestone(12), 15);
    }

    #[test]
    fn exact_multiple_counts_as_earned() {
        assert_eq!(earned_milestones(15), vec![5, 10, 15]);
        assert_eq!(next_milestone(15), 20);
    }

    #[test]
    fn next_milestone_from_zero() {
        assert_eq!(next_milestone(0), 5);
        assert_eq!(next_milestone(4), 5);
    }

    #[test]
    fn missing_is_set_difference() {
        let awarded: BTreeSet<u32> = [5, 15, 40].into_iter().collect();
        assert_eq!(missing_milestones(&[5, 10, 15, 20], &awarded), vec![10, 20]);
    }

    #[test]
    fn validate_points_rejects_negative() {
        assert_eq!(validate_points(-1), Err(ValidationError::NegativePoints(-1)));
        assert_eq!(validate_points(0), Ok(0));
        assert!(validate_points(i64::from(MAX_POINTS) + 1).is_err());
    }

    #[test]
    fn validate_milestone_requires_multiple_of_five() {
        assert_eq!(validate_milestone(10), Ok(10));
        assert!(validate_milestone(0).is_err());
        assert!(validate_milestone(7).is_err());
        assert!(validate_milestone(-5).is_err());
    }

    #[test]
    fn progress_uses_band_formula() {
        let progress = BadgeProgress::compute(12, 2);
        assert_eq!(progress.current_points, 12);
        assert_eq!(progress.milestones_reached, 2);
        assert_eq!(progress.next_milestone, 15);
        assert_eq!(progress.points_to_next_badge, 3);
        assert!((progress.progress_percent - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_at_exact_milestone_is_zero_percent() {
        let progress = BadgeProgress::compute(10, 2);
        assert_eq!(progress.points_to_next_badge, 5);
        assert_eq!(progress.progress_percent, 0.0);
    }

    #[test]
    fn next_milestone_saturates_at_ceiling() {
        assert!(next_milestone(u32::MAX) >= u32::MAX - MILESTONE_STEP);
    }

    proptest! {
        #[test]
        fn earned_matches_closed_form(p in 0u32..100_000) {
            let expected: Vec<u32> = (1..=p / 5).map(|k| 5 * k).collect();
            prop_assert_eq!(earned_milestones(p), expected);
        }

        #[test]
        fn next_matches_closed_form(p in 0u32..MAX_POINTS) {
            prop_assert_eq!(next_milestone(p), 5 * (p / 5 + 1));
            prop_assert!(next_milestone(p) > p);
        }

        #[test]
        fn every_earned_value_is_a_milestone(p in 0u32..10_000) {
            for m in earned_milestones(p) {
                prop_assert!(is_milestone(m));
                prop_assert!(m <= p);
            }
        }
    }
}
