//! User profiles and point changes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::UserId;

/// A user's profile as far as rewards are concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    /// Null or negative stored values read as zero.
    #[serde(default, deserialize_with = "points_or_zero")]
    pub points: u32,
}

fn points_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map_or(0, |p| p.clamp(0, i64::from(u32::MAX)) as u32))
}

/// Outcome of an atomic point increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointsChange {
    pub previous_points: u32,
    pub new_points: u32,
    pub points_added: u32,
}

impl PointsChange {
    pub fn new(previous_points: u32, new_points: u32) -> Self {
        Self {
            previous_points,
            new_points,
            points_added: new_points.saturating_sub(previous_points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_points_read_as_zero() {
        let p: Profile = serde_json::from_str(r#"{"user_id": "u1", "points": null}"#).unwrap();
        assert_eq!(p.points, 0);
        assert_eq!(p.username, None);
    }

    #[test]
    fn missing_points_read_as_zero() {
        let p: Profile = serde_json::from_str(r#"{"user_id": "u1", "username": "ana"}"#).unwrap();
        assert_eq!(p.points, 0);
        assert_eq!(p.username.as_deref(), Some("ana"));
    }

    #[test]
    fn negative_points_clamp() {
        let p: Profile = serde_json::from_str(r#"{"user_id": "u1", "points": -3}"#).unwrap();
        assert_eq!(p.points, 0);
    }

    #[test]
    fn change_reports_delta() {
        let change = PointsChange::new(4, 5);
        assert_eq!(change.points_added, 1);
    }
}
