//! # streetcred-cli — StreetCred Operator CLI
//!
//! ## Subcommands
//!
//! - `milestones` — earned milestones and progress for a point total
//! - `classify` — the neighborhood a coordinate classifies to
//! - `import-badges` — upload badge artwork and add it to the catalog
//! - `reassign` — rewrite a user's awards with badges from named locations
//!
//! Argument parsing lives in each module's `Args` struct; the `run`
//! functions delegate to the domain crates and return the text to print.

pub mod classify;
pub mod import_badges;
pub mod milestones;
pub mod reassign;
