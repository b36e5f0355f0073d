//! Civic Policy: severity derivation, access control, and audit
//!
//! # Architecture
//!
//! ```text
//! (category, trust score) → SeverityEngine → (severity score, priority tier)
//!
//! (authority, report)     → check_access   → Verdict ALLOW/DENY → Audit Trail
//! (authority, filter)     → can_list       → RegionConstraint
//! ```
//!
//! # Severity
//!
//! ```
//! use civic_core::{IssueCategory, PriorityTier};
//! use civic_policy::severity;
//!
//! // A low-trust fire report is discounted below HIGH
//! let assessment = severity::derive(IssueCategory::Fire, 35.0).unwrap();
//! assert_eq!(assessment.severity_score, 65);
//! assert_eq!(assessment.priority, PriorityTier::Medium);
//! ```
//!
//! # Access
//!
//! ```
//! use civic_core::{Authority, RegionCode, Role};
//! use civic_policy::{can_list, RegionConstraint};
//!
//! let officer = Authority::new("officer@city.gov", "Officer", Role::Authority)
//!     .with_region(RegionCode::new("560001").unwrap());
//!
//! // A filter outside the assigned set falls back to the assigned set
//! let foreign = RegionCode::new("999999").unwrap();
//! assert_eq!(can_list(&officer, Some(&foreign)), can_list(&officer, None));
//! assert!(!can_list(&officer, None).is_nothing());
//! ```

pub mod access;
pub mod audit;
pub mod severity;
pub mod verdict;

pub use access::{authorize, can_access, can_list, check_access, Action, RegionConstraint};
pub use audit::{AuditEntry, AuditEventType, AUDIT_TARGET};
pub use severity::{priority_for, SeverityAssessment, SeverityEngine, SeverityError, TrustBand};
pub use verdict::{AccessRule, Verdict};
