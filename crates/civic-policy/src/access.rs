//! Region-scoped access control
//!
//! Every read or mutation an authority performs on reports goes through
//! this module. Rules, in order:
//!
//! 1. `admin` role: unconditional access, unconstrained listing.
//! 2. No assigned regions: no access, empty listing (deny by default).
//! 3. Otherwise: access iff the report's region is assigned; listing is
//!    limited to the assigned set, narrowed by a region filter only when
//!    that filter is itself assigned. An unassigned filter is ignored.
//!
//! Single-report access rejects outright while list filtering silently
//! widens back to the assigned set. Both behaviours are relied upon.

use crate::audit::{AuditEntry, AuditEventType};
use crate::verdict::{AccessRule, Verdict};
use civic_core::{Authority, CivicError, CivicResult, RegionCode, Report};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What the principal is trying to do, for audit purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    UpdateResolution,
    Verify,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::UpdateResolution => write!(f, "update_resolution"),
            Action::Verify => write!(f, "verify"),
        }
    }
}

/// Which regions a listing may return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionConstraint {
    /// Any region
    Unconstrained,
    /// Only these regions (never empty)
    Regions(BTreeSet<RegionCode>),
    /// No results at all
    Nothing,
}

impl RegionConstraint {
    pub fn permits(&self, region: &RegionCode) -> bool {
        match self {
            RegionConstraint::Unconstrained => true,
            RegionConstraint::Regions(regions) => regions.contains(region),
            RegionConstraint::Nothing => false,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, RegionConstraint::Nothing)
    }
}

/// Decide whether `principal` may act on `report`
pub fn check_access(principal: &Authority, report: &Report) -> Verdict {
    if principal.is_admin() {
        return Verdict::allow(AccessRule::AdminOverride);
    }
    if principal.assigned_regions.is_empty() {
        return Verdict::deny(
            AccessRule::NoAssignedRegions,
            "no regions are assigned to this authority",
        );
    }
    if principal.assigned_regions.contains(report.region()) {
        Verdict::allow(AccessRule::AssignedRegion)
    } else {
        Verdict::deny(
            AccessRule::OutsideAssignedRegions,
            format!("region {} is not assigned to this authority", report.region()),
        )
    }
}

pub fn can_access(principal: &Authority, report: &Report) -> bool {
    check_access(principal, report).is_allowed()
}

/// Check access, record the decision, and turn a denial into an error.
pub fn authorize(principal: &Authority, report: &Report, action: Action) -> CivicResult<()> {
    let verdict = check_access(principal, report);

    AuditEntry::new(AuditEventType::AccessDecision, action.to_string())
        .with_actor(&principal.email)
        .with_report(report.tracking_code().as_str())
        .with_region(report.region().as_str())
        .with_verdict(&verdict)
        .emit();

    match verdict {
        Verdict::Allow { .. } => Ok(()),
        Verdict::Deny { reason, .. } => Err(CivicError::Authorization(reason)),
    }
}

/// Resolve the region constraint for a listing request
pub fn can_list(principal: &Authority, region_filter: Option<&RegionCode>) -> RegionConstraint {
    if principal.is_admin() {
        return match region_filter {
            Some(region) => RegionConstraint::Regions(BTreeSet::from([region.clone()])),
            None => RegionConstraint::Unconstrained,
        };
    }
    if principal.assigned_regions.is_empty() {
        return RegionConstraint::Nothing;
    }
    match region_filter {
        Some(region) if principal.assigned_regions.contains(region) => {
            RegionConstraint::Regions(BTreeSet::from([region.clone()]))
        }
        _ => RegionConstraint::Regions(principal.assigned_regions.clone()),
    }
}
