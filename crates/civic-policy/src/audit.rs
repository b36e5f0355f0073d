//! Audit trail generation
//!
//! Access decisions and verification outcomes are emitted as structured
//! `tracing` events under the `civic::audit` target. Nothing is buffered
//! in process; the subscriber decides where entries end up.

use crate::verdict::Verdict;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const AUDIT_TARGET: &str = "civic::audit";

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: String,

    /// Timestamp (Unix ms)
    pub timestamp: i64,

    pub event_type: AuditEventType,

    /// Operation being audited (e.g. "verify")
    pub operation: String,

    /// Who triggered this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Tracking code of the report involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,

    /// Outcome or additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn new(event_type: AuditEventType, operation: impl Into<String>) -> Self {
        Self {
            id: generate_audit_id(),
            timestamp: Utc::now().timestamp_millis(),
            event_type,
            operation: operation.into(),
            actor: None,
            report: None,
            region: None,
            verdict: None,
            context: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_report(mut self, tracking_code: impl Into<String>) -> Self {
        self.report = Some(tracking_code.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_verdict(mut self, verdict: &Verdict) -> Self {
        self.verdict = Some(verdict.clone());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn is_denial(&self) -> bool {
        self.verdict.as_ref().is_some_and(Verdict::is_denied)
    }

    /// Write the entry to the audit target
    pub fn emit(&self) {
        let entry = serde_json::to_string(self).unwrap_or_else(|_| self.id.clone());
        if self.is_denial() {
            tracing::warn!(
                target: AUDIT_TARGET,
                audit_id = %self.id,
                event = ?self.event_type,
                operation = %self.operation,
                %entry,
                "access denied"
            );
        } else {
            tracing::info!(
                target: AUDIT_TARGET,
                audit_id = %self.id,
                event = ?self.event_type,
                operation = %self.operation,
                %entry,
                "audit"
            );
        }
    }
}

/// Type of audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Access control decision for a single report
    AccessDecision,
    /// Listing scoped by region
    ListingScope,
    /// Verification committed (completed or failed)
    Verification,
    /// Resolution state overwritten
    ResolutionChange,
    /// Authority seeded at deployment
    Seeding,
}

fn generate_audit_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("aud_{:x}_{:04x}", timestamp, counter % 0xFFFF)
}
