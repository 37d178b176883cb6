//! # NYC Neighborhood Reference Table
//!
//! Approximate center coordinates of 41 Manhattan neighborhoods. The table
//! drives both the generative classifier prompt and the offline
//! nearest-center fallback, and is the canonical spelling for classifier
//! output.

use serde::Serialize;

use crate::badge::SPONSOR_LOCATIONS;
use crate::geo::{haversine_km, Coordinates};

/// A named neighborhood center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighborhood {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

const fn n(name: &'static str, lat: f64, lon: f64) -> Neighborhood {
    Neighborhood { name, lat, lon }
}

/// Reference neighborhood centers.
pub const NYC_NEIGHBORHOODS: [Neighborhood; 41] = [
    n("Battery Park City", 40.7150, -74.0165),
    n("Civic Center", 40.7125, -74.0058),
    n("Chinatown", 40.7162, -73.9968),
    n("East Village", 40.7268, -73.9812),
    n("Financial District", 40.7085, -74.0085),
    n("Flatiron District", 40.7415, -73.9895),
    n("Greenwich Village", 40.7340, -74.0032),
    n("Little Italy", 40.7198, -73.9970),
    n("Lower East Side", 40.7145, -73.9840),
    n("Meatpacking District", 40.7425, -74.0080),
    n("NoHo", 40.7278, -73.9940),
    n("SoHo", 40.7238, -74.0035),
    n("South Street Seaport", 40.7058, -74.0030),
    n("Tribeca", 40.7168, -74.0090),
    n("Union Square", 40.7362, -73.9915),
    n("West Village", 40.7362, -74.0028),
    n("Chelsea", 40.7470, -74.0018),
    n("Garment District", 40.7545, -73.9910),
    n("Gramercy Park", 40.7382, -73.9858),
    n("Hell's Kitchen", 40.7642, -73.9922),
    n("Hudson Yards", 40.7540, -74.0018),
    n("Kips Bay", 40.7425, -73.9772),
    n("Murray Hill", 40.7485, -73.9778),
    n("Midtown", 40.7552, -73.9838),
    n("NoMad", 40.7450, -73.9882),
    n("Stuyvesant Town", 40.7315, -73.9765),
    n("Times Square", 40.7585, -73.9858),
    n("Turtle Bay", 40.7525, -73.9682),
    n("Central Park", 40.7835, -73.9650),
    n("East Harlem", 40.7962, -73.9385),
    n("Fort George", 40.8572, -73.9362),
    n("Hamilton Heights", 40.8240, -73.9505),
    n("Harlem", 40.8122, -73.9460),
    n("Hudson Heights", 40.8522, -73.9390),
    n("Inwood", 40.8682, -73.9208),
    n("Manhattan Valley", 40.7995, -73.9675),
    n("Morningside Heights", 40.8115, -73.9628),
    n("Upper East Side", 40.7742, -73.9562),
    n("Upper West Side", 40.7878, -73.9758),
    n("Washington Heights", 40.8508, -73.9345),
    n("Yorkville", 40.7770, -73.9545),
];

/// Build the classification prompt for a position.
pub fn classifier_prompt(at: &Coordinates) -> String {
    let examples = NYC_NEIGHBORHOODS
        .iter()
        .map(|h| format!("{}: [{:.4}, {:.4}]", h.name, h.lat, h.lon))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a NYC geography expert. Here are the neighborhoods with their approximate center coordinates:\n\n\
         {examples}\n\n\
         Given these coordinates: [{}, {}]\n\n\
         Return ONLY the closest neighborhood name from the list above.",
        at.lat(),
        at.lon()
    )
}

/// Normalize free-form classifier output to a location name.
///
/// Takes the first non-empty line, strips quoting, markdown emphasis and a
/// trailing period, then maps case-insensitive matches to the canonical
/// spelling of a neighborhood or sponsor. Unknown names pass through
/// trimmed. Returns `None` when nothing is left.
pub fn canonical_name(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let cleaned = line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .trim_end_matches('.')
        .trim();
    if cleaned.is_empty() {
        return None;
    }

    let known = NYC_NEIGHBORHOODS
        .iter()
        .map(|h| h.name)
        .chain(SPONSOR_LOCATIONS.iter().copied())
        .find(|name| name.eq_ignore_ascii_case(cleaned));

    Some(known.unwrap_or(cleaned).to_string())
}

/// The reference neighborhood whose center is closest to `at`.
pub fn nearest_neighborhood(at: &Coordinates) -> &'static Neighborhood {
    let mut best = &NYC_NEIGHBORHOODS[0];
    let mut best_km = f64::INFINITY;
    for hood in NYC_NEIGHBORHOODS.iter() {
        let d = haversine_km(at.lat(), at.lon(), hood.lat, hood.lon);
        if d < best_km {
            best = hood;
            best_km = d;
        }
    }
    best
}
