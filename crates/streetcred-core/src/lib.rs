//! # streetcred-core — Foundational Types for StreetCred
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies and performs no I/O: everything here is a pure function
//! or a validated value type.
//!
//! ## Design Principles
//!
//! 1. **Validated newtypes at the boundary.** A [`UserId`], [`Coordinates`]
//!    or [`ImagePayload`] can only be constructed through a checking
//!    constructor, so downstream services never re-validate.
//!
//! 2. **Milestones are unsigned.** Point totals are `u32`; negative input is
//!    rejected by [`milestone::validate_points`] before it reaches the domain.
//!
//! 3. **One badge-pool rule.** [`BadgePool`] is the only place that decides
//!    whether a neighborhood draws from the sponsor set or its own badges.
//!    Store implementations translate it into their own query dialect.
//!
//! 4. **[`ValidationError`] for every rejected input.** Structured errors with
//!    `thiserror`, no `.unwrap()` outside tests.

pub mod badge;
pub mod error;
pub mod geo;
pub mod identity;
pub mod image;
pub mod limit;
pub mod milestone;
pub mod neighborhood;
pub mod profile;
pub mod report;

// Re-export primary types at crate root for ergonomic imports.
pub use badge::{
    Badge, BadgeAward, BadgeId, BadgePool, EarnedBadge, NewBadge, UserBadge, SPONSOR_LOCATIONS,
};
pub use error::ValidationError;
pub use geo::{haversine_km, Coordinates, EARTH_RADIUS_KM};
pub use identity::UserId;
pub use image::{ImageExtension, ImagePayload};
pub use milestone::{BadgeProgress, MILESTONE_STEP};
pub use neighborhood::{Neighborhood, NYC_NEIGHBORHOODS};
pub use profile::{PointsChange, Profile};
pub use report::{NearbyReport, NewReport, Report, ReportId};
