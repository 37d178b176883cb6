//! # Reassign Subcommand
//!
//! Rewrite a user's existing awards: each `milestone=location` pair draws a
//! random badge from that location's pool and replaces the award's badge.
//! Pairs whose location has no badges, or whose milestone the user never
//! earned, are reported and skipped.
//!
//! Runs against the Supabase project named by `SUPABASE_URL` and
//! `SUPABASE_KEY`.

use anyhow::Context;
use clap::Args;
use streetcred_client::{SupabaseClient, SupabaseConfig};
use streetcred_core::milestone::validate_milestone;
use streetcred_core::UserId;
use streetcred_rewards::{NearestNeighborhoodClassifier, Reassignment, RecordStore, RewardEngine};

/// One `milestone=location` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub milestone: u32,
    pub location: String,
}

/// Parse `15=Harlem` into an [`Assignment`].
pub fn parse_assignment(raw: &str) -> Result<Assignment, String> {
    let (milestone, location) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected MILESTONE=LOCATION, got \"{raw}\""))?;
    let value: i64 = milestone
        .trim()
        .parse()
        .map_err(|_| format!("milestone \"{}\" is not a number", milestone.trim()))?;
    let milestone = validate_milestone(value).map_err(|e| e.to_string())?;
    let location = location.trim();
    if location.is_empty() {
        return Err(format!("empty location for milestone {milestone}"));
    }
    Ok(Assignment {
        milestone,
        location: location.to_string(),
    })
}

/// Arguments for the reassign subcommand.
#[derive(Args, Debug)]
pub struct ReassignArgs {
    /// User whose awards are rewritten.
    #[arg(long)]
    pub user: String,
    /// Seed for the badge draw, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
    /// `MILESTONE=LOCATION` pairs, e.g. `5="Times Square" 10=BlackRock`.
    #[arg(required = true, value_parser = parse_assignment)]
    pub assignments: Vec<Assignment>,
}

pub async fn run(args: &ReassignArgs) -> anyhow::Result<String> {
    let user = UserId::new(&args.user)?;
    let config = SupabaseConfig::from_env().context("reassign needs a Supabase project")?;
    let client = SupabaseClient::new(config)?;
    let store = client.records().clone();

    let engine = match args.seed {
        Some(seed) => RewardEngine::with_seed(store, NearestNeighborhoodClassifier, seed),
        None => RewardEngine::new(store, NearestNeighborhoodClassifier),
    };
    let outcomes = reassign_all(&engine, &user, &args.assignments).await?;
    Ok(render(&user, &outcomes))
}

/// Apply each assignment in order.
pub async fn reassign_all<S: RecordStore>(
    engine: &RewardEngine<S, NearestNeighborhoodClassifier>,
    user: &UserId,
    assignments: &[Assignment],
) -> anyhow::Result<Vec<Reassignment>> {
    let mut outcomes = Vec::with_capacity(assignments.len());
    for a in assignments {
        let outcome = engine
            .reassign(user, a.milestone, &a.location)
            .await
            .with_context(|| format!("reassigning milestone {} for {user}", a.milestone))?;
        match &outcome {
            Reassignment::Updated { milestone, badge } => tracing::info!(
                user_id = %user,
                milestone,
                badge_id = badge.id,
                "award reassigned"
            ),
            Reassignment::NoBadges { milestone, location } => {
                tracing::warn!(user_id = %user, milestone, location = %location, "no badges at location")
            }
            Reassignment::NoAward { milestone } => {
                tracing::warn!(user_id = %user, milestone, "user holds no award for milestone")
            }
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn render(user: &UserId, outcomes: &[Reassignment]) -> String {
    let mut lines = Vec::with_capacity(outcomes.len() + 1);
    let updated = outcomes
        .iter()
        .filter(|o| matches!(o, Reassignment::Updated { .. }))
        .count();
    lines.push(format!("{user}: {updated}/{} awards reassigned", outcomes.len()));
    for outcome in outcomes {
        lines.push(match outcome {
            Reassignment::Updated { milestone, badge } => format!(
                "  {milestone:>4}  -> {} {} (badge {})",
                badge.location_name, badge.animal, badge.id
            ),
            Reassignment::NoBadges { milestone, location } => {
                format!("  {milestone:>4}  skipped: no badges at {location}")
            }
            Reassignment::NoAward { milestone } => {
                format!("  {milestone:>4}  skipped: no award for this milestone")
            }
        });
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetcred_core::Badge;
    use streetcred_rewards::MemoryStore;

    fn user() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[test]
    fn parses_assignment() {
        assert_eq!(
            parse_assignment("15=Times Square").unwrap(),
            Assignment {
                milestone: 15,
                location: "Times Square".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_assignments() {
        assert!(parse_assignment("15").is_err());
        assert!(parse_assignment("x=Harlem").is_err());
        assert!(parse_assignment("7=Harlem").is_err());
        assert!(parse_assignment("10=  ").is_err());
    }

    #[tokio::test]
    async fn reassigns_existing_awards_and_skips_the_rest() {
        let store = MemoryStore::new();
        store.upsert_profile(user(), None, 10);
        store.add_badges([
            Badge {
                id: 1,
                animal: "Pigeon".into(),
                location_name: "SoHo".into(),
                image_url: None,
            },
            Badge {
                id: 2,
                animal: "Hawk".into(),
                location_name: "Harlem".into(),
                image_url: None,
            },
        ]);
        store.insert_award(&user(), 1, 5).await.unwrap();

        let engine = RewardEngine::with_seed(store.clone(), NearestNeighborhoodClassifier, 1);
        let assignments = [
            parse_assignment("5=Harlem").unwrap(),
            parse_assignment("10=Harlem").unwrap(),
            parse_assignment("5=Astoria").unwrap(),
        ];
        let outcomes = reassign_all(&engine, &user(), &assignments).await.unwrap();

        assert!(matches!(&outcomes[0], Reassignment::Updated { badge, .. } if badge.id == 2));
        assert_eq!(outcomes[1], Reassignment::NoAward { milestone: 10 });
        assert!(matches!(&outcomes[2], Reassignment::NoBadges { .. }));
        assert_eq!(store.awards()[0].badge_id, 2);

        let text = render(&user(), &outcomes);
        assert!(text.starts_with("alice: 1/3 awards reassigned"));
    }
}
