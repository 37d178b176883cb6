//! # Coordinates & Great-Circle Distance
//!
//! Report proximity and the offline neighborhood classifier both measure
//! distance with the haversine formula on a spherical Earth of radius
//! [`EARTH_RADIUS_KM`].

use serde::Serialize;

use crate::error::ValidationError;

/// Mean Earth radius used for all distance computations, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated WGS84 position.
///
/// Latitude is in [-90, 90] and longitude in [-180, 180]; both finite.
/// Deliberately not `Deserialize`: construct via [`Coordinates::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Validate a latitude/longitude pair.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to `(lat, lon)` in kilometers.
    pub fn distance_to(&self, lat: f64, lon: f64) -> f64 {
        haversine_km(self.lat, self.lon, lat, lon)
    }
}

/// Haversine great-circle distance between two points, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Clamp guards asin against a > 1.0 from rounding at antipodes.
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Round a distance to two decimal places for presentation.
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}

/// Validate a search radius in kilometers.
pub fn validate_radius(radius_km: f64) -> Result<f64, ValidationError> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(radius_km)
    } else {
        Err(ValidationError::InvalidRadius(radius_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_km(40.758, -73.9855, 40.758, -73.9855), 0.0);
    }

    #[test]
    fn times_square_to_union_square() {
        // Roughly 2.6 km down Broadway.
        let d = haversine_km(40.7585, -73.9858, 40.7362, -73.9915);
        assert!((2.4..2.7).contains(&d), "got {d}");
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            Coordinates::new(90.5, 0.0),
            Err(ValidationError::InvalidLatitude(90.5))
        );
        assert_eq!(
            Coordinates::new(0.0, -180.5),
            Err(ValidationError::InvalidLongitude(-180.5))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_boundaries() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn round_km_two_decimals() {
        assert_eq!(round_km(111.194_926), 111.19);
        assert_eq!(round_km(0.004), 0.0);
        assert_eq!(round_km(0.005), 0.01);
    }

    #[test]
    fn radius_validation() {
        assert_eq!(validate_radius(1.0), Ok(1.0));
        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(-2.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let ab = haversine_km(lat1, lon1, lat2, lon2);
            let ba = haversine_km(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() < 1e-6);
        }

        #[test]
        fn distance_bounded_by_half_circumference(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let d = haversine_km(lat1, lon1, lat2, lon2);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
