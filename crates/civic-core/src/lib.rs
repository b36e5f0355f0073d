//! Civic Core: report and authority model, lifecycle transitions, errors
//!
//! A report moves along two independent axes. Verification tracks the
//! external image classification; resolution tracks how authorities handle
//! the issue. Derived severity fields are written only by a completed
//! verification.

pub mod data_model;
pub mod error;
pub mod geohash;
pub mod lifecycle;
pub mod tracking;

pub use data_model::{
    ArtifactRef, Assessment, Authority, AuthorityId, Coordinates, IssueCategory, PriorityTier,
    RegionCode, Report, ReportId, ResolutionState, Role, TrustScore, VerificationState,
};
pub use error::{CivicError, CivicResult};
pub use lifecycle::{Submission, SubmissionForm, VerificationUpdate};
pub use tracking::TrackingCode;

/// Service version reported by the health endpoint
pub const CIVIC_VERSION: &str = "1.0.0";
