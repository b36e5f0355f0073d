//! Verdict types for access decisions
//!
//! Provides Allow/Deny verdicts with the rule that produced them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Access granted
    Allow {
        /// Which rule granted it
        rule: AccessRule,
    },

    /// Access refused
    Deny {
        rule: AccessRule,
        /// Human-readable reason
        reason: String,
    },
}

impl Verdict {
    pub fn allow(rule: AccessRule) -> Self {
        Verdict::Allow { rule }
    }

    pub fn deny(rule: AccessRule, reason: impl Into<String>) -> Self {
        Verdict::Deny {
            rule,
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Verdict::Deny { .. })
    }

    pub fn rule(&self) -> AccessRule {
        match self {
            Verdict::Allow { rule } | Verdict::Deny { rule, .. } => *rule,
        }
    }
}

/// The access rule that decided a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRule {
    /// Admins see everything
    AdminOverride,
    /// Report region is in the authority's assigned set
    AssignedRegion,
    /// Report region is outside the assigned set
    OutsideAssignedRegions,
    /// Authority has no regions at all
    NoAssignedRegions,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Allow { rule } => write!(f, "ALLOW ({:?})", rule),
            Verdict::Deny { rule, reason } => write!(f, "DENY ({:?}): {}", rule, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_accessors() {
        let allow = Verdict::allow(AccessRule::AdminOverride);
        assert!(allow.is_allowed());
        assert_eq!(allow.rule(), AccessRule::AdminOverride);

        let deny = Verdict::deny(AccessRule::NoAssignedRegions, "no regions assigned");
        assert!(deny.is_denied());
        assert!(deny.to_string().contains("no regions assigned"));
    }

    #[test]
    fn test_verdict_serialization() {
        let deny = Verdict::deny(AccessRule::OutsideAssignedRegions, "region 560002");
        let json = serde_json::to_value(&deny).unwrap();
        assert_eq!(json["type"], "DENY");
        assert_eq!(json["rule"], "outside_assigned_regions");
    }
}
