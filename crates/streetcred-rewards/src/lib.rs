//! # streetcred-rewards — Reward & Report Services
//!
//! The behavior of StreetCred over abstract collaborators:
//!
//! - [`RewardEngine`]: milestone checks, atomic point updates, badge
//!   queries, leaderboard and award reassignment.
//! - [`ReportService`]: report submission (with best-effort image upload),
//!   listing and proximity search.
//!
//! Persistence and classification are constructor dependencies behind the
//! [`RecordStore`], [`BlobStore`] and [`LocationClassifier`] traits.
//! [`MemoryStore`] and the offline classifiers are complete implementations
//! used for development mode and tests; hosted implementations live in
//! `streetcred-client`.

pub mod classifier;
pub mod engine;
pub mod error;
pub mod locks;
pub mod memory;
pub mod reports;
pub mod store;

pub use classifier::{FixedClassifier, LocationClassifier, NearestNeighborhoodClassifier};
pub use engine::{MilestoneCheck, PointsUpdate, Reassignment, RewardEngine};
pub use error::{BlobError, ClassifierError, RewardError, StoreError};
pub use memory::MemoryStore;
pub use reports::{ImageSource, ImageUpload, ReportService, SubmittedReport, REPORT_POINTS};
pub use store::{AwardInsert, BlobStore, RecordStore};
