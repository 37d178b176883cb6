//! # Milestones Subcommand
//!
//! Pure arithmetic: which milestones a point total has earned, the next
//! one, and progress toward it. Touches no store.

use clap::Args;
use serde_json::json;
use streetcred_core::milestone::{earned_milestones, validate_points};
use streetcred_core::BadgeProgress;

/// Arguments for the milestones subcommand.
#[derive(Args, Debug)]
pub struct MilestonesArgs {
    /// Point total to evaluate.
    #[arg(allow_negative_numbers = true)]
    pub points: i64,
}

pub fn run(args: &MilestonesArgs) -> anyhow::Result<String> {
    let points = validate_points(args.points)?;
    let earned = earned_milestones(points);
    let progress = BadgeProgress::compute(points, earned.len());
    let report = json!({
        "points": points,
        "earned_milestones": earned,
        "next_milestone": progress.next_milestone,
        "points_to_next_badge": progress.points_to_next_badge,
        "progress_percent": progress.progress_percent,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(points: i64) -> serde_json::Value {
        serde_json::from_str(&run(&MilestonesArgs { points }).unwrap()).unwrap()
    }

    #[test]
    fn twelve_points() {
        let out = parse(12);
        assert_eq!(out["earned_milestones"], json!([5, 10]));
        assert_eq!(out["next_milestone"], 15);
        assert_eq!(out["points_to_next_badge"], 3);
    }

    #[test]
    fn zero_points() {
        let out = parse(0);
        assert_eq!(out["earned_milestones"], json!([]));
        assert_eq!(out["next_milestone"], 5);
    }

    #[test]
    fn negative_points_error() {
        assert!(run(&MilestonesArgs { points: -1 }).is_err());
    }
}
