//! Response bodies
use chrono::{DateTime, Utc};
use civic_core::{
    Authority, AuthorityId, Coordinates, IssueCategory, PriorityTier, RegionCode, Report,
    ResolutionState, Role, VerificationState,
};
use civic_service::VerificationResult;
use serde::Serialize;
use serde_json::{json, Value};

/// What anyone holding a tracking code may see
#[derive(Debug, Clone, Serialize)]
pub struct PublicReport {
    pub tracking_code: String,
    pub issue_type: IssueCategory,
    pub description: String,
    pub region: RegionCode,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub status: ResolutionState,
    pub verification_status: VerificationState,
    pub trust_score: Option<f64>,
    pub priority: PriorityTier,
    pub created_at: DateTime<Utc>,
}

impl From<&Report> for PublicReport {
    fn from(report: &Report) -> Self {
        Self {
            tracking_code: report.tracking_code().to_string(),
            issue_type: report.issue_type(),
            description: report.description().to_string(),
            region: report.region().clone(),
            address: report.address().to_string(),
            coordinates: report.coordinates(),
            status: report.resolution(),
            verification_status: report.verification_state(),
            trust_score: report.trust_score(),
            priority: report.priority(),
            created_at: report.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Submitted {
    pub message: &'static str,
    pub tracking_code: String,
    pub verification_status: VerificationState,
}

impl From<&Report> for Submitted {
    fn from(report: &Report) -> Self {
        Self {
            message: "Report submitted successfully",
            tracking_code: report.tracking_code().to_string(),
            verification_status: report.verification_state(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportList {
    pub reports: Vec<Report>,
    pub total: usize,
    pub limit: usize,
    pub skip: usize,
}

#[derive(Debug, Serialize)]
pub struct ResolutionUpdated {
    pub message: &'static str,
    pub report: Report,
}

#[derive(Debug, Serialize)]
pub struct Verified {
    pub message: &'static str,
    pub trust_score: f64,
    pub severity_score: u8,
    pub priority: PriorityTier,
    pub explanation: Value,
}

impl From<VerificationResult> for Verified {
    fn from(result: VerificationResult) -> Self {
        Self {
            message: "Verification completed",
            trust_score: result.severity.trust_score.value(),
            severity_score: result.severity.severity_score,
            priority: result.severity.priority,
            explanation: result.explanation.unwrap_or_else(|| json!({})),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorityView {
    pub id: AuthorityId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub assigned_regions: Vec<RegionCode>,
}

impl From<&Authority> for AuthorityView {
    fn from(authority: &Authority) -> Self {
        Self {
            id: authority.id,
            email: authority.email.clone(),
            name: authority.name.clone(),
            role: authority.role,
            assigned_regions: authority.assigned_regions.iter().cloned().collect(),
        }
    }
}
