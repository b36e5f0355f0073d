//! Report operations as exposed to the outside world
//!
//! Public operations (submission, tracking) need no principal. Every
//! authority operation takes the authenticated [`Authority`] and consults
//! access control before touching the store.

use crate::classifier::Classifier;
use crate::orchestrator::{VerificationOrchestrator, VerificationOutcome, VerificationResult};
use chrono::Utc;
use civic_core::{
    Authority, CivicError, CivicResult, PriorityTier, RegionCode, Report, ReportId,
    ResolutionState, SubmissionForm, TrackingCode,
};
use civic_policy::{access, can_list, Action, AuditEntry, AuditEventType};
use civic_store::{ArtifactStore, ImageUpload, Page, ReportQuery, ReportStore, DEFAULT_LIMIT};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Attempts at issuing a unique tracking code before giving up
const TRACKING_CODE_ATTEMPTS: usize = 3;

/// Listing parameters as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRequest {
    #[serde(alias = "pincode")]
    pub region: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

pub struct ReportService {
    reports: Arc<dyn ReportStore>,
    artifacts: Arc<dyn ArtifactStore>,
    orchestrator: VerificationOrchestrator,
}

impl ReportService {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        artifacts: Arc<dyn ArtifactStore>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        let orchestrator =
            VerificationOrchestrator::new(reports.clone(), artifacts.clone(), classifier);
        Self {
            reports,
            artifacts,
            orchestrator,
        }
    }

    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_timeout(timeout);
        self
    }

    pub fn classifier_configured(&self) -> bool {
        self.orchestrator.is_configured()
    }

    /// Accept a public submission.
    ///
    /// Nothing is stored unless the whole submission is valid; an artifact
    /// written for a report that then fails to persist is removed again.
    pub async fn submit(
        &self,
        form: SubmissionForm,
        upload: Option<ImageUpload>,
    ) -> CivicResult<Report> {
        let upload = upload.ok_or_else(|| CivicError::validation("Image is required"))?;
        let submission = form.validate()?;
        let image = upload.accept()?;

        let artifact = self.artifacts.put(image).await?;
        let now = Utc::now();
        let mut report = Report::submit(
            submission,
            artifact.clone(),
            TrackingCode::generate(now),
            self.classifier_configured(),
            now,
        );

        let mut attempt = 1;
        let stored = loop {
            match self.reports.insert(report.clone()).await {
                Ok(()) => break Ok(()),
                Err(CivicError::Conflict(reason)) if attempt < TRACKING_CODE_ATTEMPTS => {
                    tracing::debug!(%reason, attempt, "tracking code collision, reissuing");
                    report.reissue_tracking_code(TrackingCode::generate(Utc::now()));
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        if let Err(e) = stored {
            tracing::error!(error = %e, artifact = %artifact, "report not stored");
            if let Err(cleanup) = self.artifacts.delete(&artifact).await {
                tracing::warn!(error = %cleanup, artifact = %artifact, "orphaned artifact");
            }
            return Err(e);
        }

        tracing::info!(
            tracking_code = %report.tracking_code(),
            issue_type = %report.issue_type(),
            region = %report.region(),
            verification = %report.verification_state(),
            "report submitted"
        );
        Ok(report)
    }

    /// Public lookup by tracking code
    pub async fn track(&self, tracking_code: &str) -> CivicResult<Report> {
        let code = TrackingCode::parse(tracking_code)?;
        self.reports.find_by_tracking_code(&code).await
    }

    /// Reports visible to `principal`, newest first
    pub async fn list(
        &self,
        principal: &Authority,
        request: &ListRequest,
    ) -> CivicResult<Page<Report>> {
        let region_filter = match non_blank(&request.region).map(RegionCode::new) {
            Some(Ok(region)) => Some(region),
            // An admin filter narrows the listing, so it has to be well-formed
            Some(Err(e)) if principal.is_admin() => return Err(e),
            // A malformed code is never in the assigned set: ignore it
            Some(Err(e)) => {
                tracing::debug!(error = %e, "ignoring malformed region filter");
                None
            }
            None => None,
        };
        let constraint = can_list(principal, region_filter.as_ref());

        AuditEntry::new(AuditEventType::ListingScope, "list")
            .with_actor(&principal.email)
            .with_context(json!({
                "requested_region": region_filter.as_ref().map(RegionCode::as_str),
                "constraint": format!("{constraint:?}"),
            }))
            .emit();

        if constraint.is_nothing() {
            return Ok(Page::empty());
        }

        let mut query = ReportQuery::new(constraint).page(
            request.limit.unwrap_or(DEFAULT_LIMIT),
            request.skip.unwrap_or(0),
        );
        if let Some(status) = non_blank(&request.status) {
            query = query.with_resolution(status.parse::<ResolutionState>()?);
        }
        if let Some(priority) = non_blank(&request.priority) {
            query = query.with_priority(priority.parse::<PriorityTier>()?);
        }
        self.reports.list(&query).await
    }

    /// Overwrite the resolution state of a report in the principal's regions
    pub async fn set_resolution(
        &self,
        principal: &Authority,
        id: ReportId,
        status: &str,
    ) -> CivicResult<Report> {
        let state = status.parse::<ResolutionState>()?;
        let report = self.reports.get(id).await?;
        access::authorize(principal, &report, Action::UpdateResolution)?;

        let updated = self.reports.set_resolution(id, state).await?;

        AuditEntry::new(AuditEventType::ResolutionChange, Action::UpdateResolution.to_string())
            .with_actor(&principal.email)
            .with_report(updated.tracking_code().as_str())
            .with_region(updated.region().as_str())
            .with_context(json!({ "from": report.resolution(), "to": updated.resolution() }))
            .emit();
        Ok(updated)
    }

    pub async fn verify(
        &self,
        principal: &Authority,
        id: ReportId,
    ) -> CivicResult<VerificationResult> {
        self.orchestrator.verify(principal, id).await
    }

    pub async fn verify_with_outcome(
        &self,
        principal: &Authority,
        id: ReportId,
    ) -> (VerificationOutcome, CivicResult<VerificationResult>) {
        self.orchestrator.verify_with_outcome(principal, id).await
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
