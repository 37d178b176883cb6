//! Pagination limits.

use crate::error::ValidationError;

/// Default page size for recent reports.
pub const DEFAULT_RECENT_LIMIT: u32 = 20;

/// Default page size for the leaderboard.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 50;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// Resolve an optional `limit` query value against `1..=max`.
pub fn validate_limit(value: Option<i64>, default: u32, max: u32) -> Result<u32, ValidationError> {
    let Some(value) = value else {
        return Ok(default);
    };
    if value < 1 || value > i64::from(max) {
        return Err(ValidationError::LimitOutOfRange { value, min: 1, max });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_uses_default() {
        assert_eq!(validate_limit(None, DEFAULT_RECENT_LIMIT, MAX_LIMIT), Ok(20));
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(validate_limit(Some(1), 20, MAX_LIMIT), Ok(1));
        assert_eq!(validate_limit(Some(100), 20, MAX_LIMIT), Ok(100));
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(validate_limit(Some(0), 20, MAX_LIMIT).is_err());
        assert!(validate_limit(Some(-4), 20, MAX_LIMIT).is_err());
        assert!(validate_limit(Some(101), 20, MAX_LIMIT).is_err());
    }
}
