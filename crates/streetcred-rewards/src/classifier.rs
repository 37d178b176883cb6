//! # Location Classification
//!
//! Maps coordinates to a location name that selects a badge pool. The
//! hosted implementation lives in `streetcred-client`; this module carries
//! the trait plus two offline implementations.

use std::future::Future;

use streetcred_core::neighborhood::nearest_neighborhood;
use streetcred_core::Coordinates;

use crate::error::ClassifierError;

/// Coordinates → location name.
pub trait LocationClassifier: Send + Sync {
    fn classify(
        &self,
        at: &Coordinates,
    ) -> impl Future<Output = Result<String, ClassifierError>> + Send;
}

/// Picks the reference neighborhood with the nearest center.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborhoodClassifier;

impl LocationClassifier for NearestNeighborhoodClassifier {
    async fn classify(&self, at: &Coordinates) -> Result<String, ClassifierError> {
        Ok(nearest_neighborhood(at).name.to_string())
    }
}

/// Always answers the same name.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    name: String,
}

impl FixedClassifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl LocationClassifier for FixedClassifier {
    async fn classify(&self, _at: &Coordinates) -> Result<String, ClassifierError> {
        Ok(self.name.clone())
    }
}
