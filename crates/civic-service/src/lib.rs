//! Civic Service: the report operations behind the HTTP surface
//!
//! [`ReportService`] owns submission, public tracking, region-scoped
//! listing and resolution updates. Verification is delegated to the
//! [`VerificationOrchestrator`], which drives the external [`Classifier`]
//! and commits the derived severity.

pub mod classifier;
pub mod orchestrator;
pub mod service;

pub use classifier::{Classification, Classifier, ClassifierError, HttpClassifier, DEFAULT_TIMEOUT};
pub use orchestrator::{VerificationOrchestrator, VerificationOutcome, VerificationResult};
pub use service::{ListRequest, ReportService};
