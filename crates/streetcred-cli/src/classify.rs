//! # Classify Subcommand
//!
//! Resolve a coordinate to a location name the way the award pass does,
//! and show which badge pool it selects. Uses Gemini when `GEMINI_API_KEY`
//! is set unless `--offline` is given.

use clap::Args;
use serde_json::json;
use streetcred_client::{GeminiClassifier, GeminiConfig};
use streetcred_core::{BadgePool, Coordinates};
use streetcred_rewards::{LocationClassifier, NearestNeighborhoodClassifier};

/// Arguments for the classify subcommand.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Latitude in degrees.
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,
    /// Longitude in degrees.
    #[arg(allow_negative_numbers = true)]
    pub lon: f64,
    /// Use the nearest-neighborhood classifier even when Gemini is configured.
    #[arg(long)]
    pub offline: bool,
}

pub async fn run(args: &ClassifyArgs) -> anyhow::Result<String> {
    let at = Coordinates::new(args.lat, args.lon)?;

    let (source, location) = if !args.offline && GeminiConfig::is_configured() {
        let classifier = GeminiClassifier::from_config(GeminiConfig::from_env()?)?;
        tracing::debug!(model = classifier.model(), "classifying with Gemini");
        ("gemini", classifier.classify(&at).await?)
    } else {
        ("nearest", NearestNeighborhoodClassifier.classify(&at).await?)
    };

    Ok(serde_json::to_string_pretty(&describe(&at, source, &location))?)
}

fn describe(at: &Coordinates, source: &str, location: &str) -> serde_json::Value {
    let pool = match BadgePool::for_location(location) {
        BadgePool::Sponsors => "sponsors",
        BadgePool::Neighborhood(_) => "neighborhood",
    };
    json!({
        "lat": at.lat(),
        "lon": at.lon(),
        "location": location,
        "badge_pool": pool,
        "classifier": source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_classification() {
        let args = ClassifyArgs {
            lat: 40.8120,
            lon: -73.9462,
            offline: true,
        };
        let out: serde_json::Value = serde_json::from_str(&run(&args).await.unwrap()).unwrap();
        assert_eq!(out["location"], "Harlem");
        assert_eq!(out["badge_pool"], "neighborhood");
        assert_eq!(out["classifier"], "nearest");
    }

    #[test]
    fn sponsor_location_selects_sponsor_pool() {
        let at = Coordinates::new(40.7, -74.0).unwrap();
        assert_eq!(describe(&at, "gemini", "BlackRock")["badge_pool"], "sponsors");
    }

    #[tokio::test]
    async fn invalid_latitude_rejected() {
        let args = ClassifyArgs {
            lat: 95.0,
            lon: 0.0,
            offline: true,
        };
        assert!(run(&args).await.is_err());
    }
}
