//! Verification Orchestrator
//!
//! ```text
//! authorize ─► load image ─► classify (bounded) ─► derive severity ─► commit COMPLETED
//!                  │               │
//!                  └── missing ────┴── any failure ─────────────────► commit FAILED
//! ```
//!
//! Re-running after COMPLETED or FAILED repeats the whole pipeline and
//! overwrites the derived fields. Concurrent runs on one report race on the
//! final commit; the last write wins and each write is whole.

use crate::classifier::{Classification, Classifier, ClassifierError, DEFAULT_TIMEOUT};
use civic_core::{
    Authority, CivicError, CivicResult, Report, ReportId, VerificationUpdate,
};
use civic_policy::{access, Action, AuditEntry, AuditEventType, SeverityAssessment, SeverityEngine};
use civic_store::{ArtifactStore, ReportStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Successful verification
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// The report as committed
    pub report: Report,
    pub severity: SeverityAssessment,
    /// Classifier explanation, passed through untouched
    pub explanation: Option<Value>,
}

/// What a verification run left behind in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// COMPLETED with a fresh assessment
    Completed,
    /// FAILED was committed
    Failed,
    /// Nothing was committed
    Rejected,
}

impl VerificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Completed => "completed",
            VerificationOutcome::Failed => "failed",
            VerificationOutcome::Rejected => "rejected",
        }
    }
}

type Stopped = (VerificationOutcome, CivicError);

fn rejected(err: CivicError) -> Stopped {
    (VerificationOutcome::Rejected, err)
}

pub struct VerificationOrchestrator {
    reports: Arc<dyn ReportStore>,
    artifacts: Arc<dyn ArtifactStore>,
    classifier: Option<Arc<dyn Classifier>>,
    engine: SeverityEngine,
    timeout: Duration,
}

impl VerificationOrchestrator {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        artifacts: Arc<dyn ArtifactStore>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            reports,
            artifacts,
            classifier,
            engine: SeverityEngine::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.classifier.is_some()
    }

    /// Verify one report on behalf of `principal`.
    ///
    /// Authorization and state errors change nothing. A missing image or a
    /// classifier failure commits FAILED and is then returned to the caller
    /// (`NotFound` and `Classifier` respectively).
    pub async fn verify(
        &self,
        principal: &Authority,
        id: ReportId,
    ) -> CivicResult<VerificationResult> {
        self.verify_with_outcome(principal, id).await.1
    }

    /// Like [`verify`](Self::verify), also reporting what was committed
    pub async fn verify_with_outcome(
        &self,
        principal: &Authority,
        id: ReportId,
    ) -> (VerificationOutcome, CivicResult<VerificationResult>) {
        match self.run(principal, id).await {
            Ok(result) => (VerificationOutcome::Completed, Ok(result)),
            Err((outcome, e)) => (outcome, Err(e)),
        }
    }

    async fn run(
        &self,
        principal: &Authority,
        id: ReportId,
    ) -> Result<VerificationResult, Stopped> {
        let report = self.reports.get(id).await.map_err(rejected)?;
        access::authorize(principal, &report, Action::Verify).map_err(rejected)?;
        report.ensure_verifiable().map_err(rejected)?;

        let image = match self.artifacts.get(report.image()).await {
            Ok(bytes) => bytes,
            Err(CivicError::NotFound(reason)) => {
                self.record_failure(principal, &report, &reason)
                    .await
                    .map_err(rejected)?;
                return Err((VerificationOutcome::Failed, CivicError::NotFound(reason)));
            }
            Err(e) => return Err(rejected(e)),
        };

        let (classification, severity) = match self.assess(&report, &image).await {
            Ok(assessed) => assessed,
            Err(e) => {
                tracing::warn!(
                    report = %report.tracking_code(),
                    error = %e,
                    "classification failed"
                );
                self.record_failure(principal, &report, &e.to_string())
                    .await
                    .map_err(rejected)?;
                return Err((VerificationOutcome::Failed, e.into()));
            }
        };

        let committed = self
            .reports
            .commit_verification(id, VerificationUpdate::Completed(severity.to_assessment()))
            .await
            .map_err(rejected)?;

        AuditEntry::new(AuditEventType::Verification, Action::Verify.to_string())
            .with_actor(&principal.email)
            .with_report(committed.tracking_code().as_str())
            .with_region(committed.region().as_str())
            .with_context(json!({
                "outcome": committed.verification_state(),
                "trust_score": severity.trust_score,
                "severity_score": severity.severity_score,
                "priority": severity.priority,
            }))
            .emit();

        Ok(VerificationResult {
            report: committed,
            severity,
            explanation: classification.explanation,
        })
    }

    async fn assess(
        &self,
        report: &Report,
        image: &[u8],
    ) -> Result<(Classification, SeverityAssessment), ClassifierError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(ClassifierError::NotConfigured)?;

        let classification =
            match tokio::time::timeout(self.timeout, classifier.classify(image, report.issue_type()))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(ClassifierError::Timeout(self.timeout)),
            };

        let severity = self
            .engine
            .derive(report.issue_type(), classification.trust_score.value())
            .map_err(|e| ClassifierError::Contract(e.to_string()))?;

        Ok((classification, severity))
    }

    async fn record_failure(
        &self,
        principal: &Authority,
        report: &Report,
        reason: &str,
    ) -> CivicResult<()> {
        let committed = self
            .reports
            .commit_verification(report.id(), VerificationUpdate::Failed)
            .await?;

        AuditEntry::new(AuditEventType::Verification, Action::Verify.to_string())
            .with_actor(&principal.email)
            .with_report(committed.tracking_code().as_str())
            .with_region(committed.region().as_str())
            .with_context(json!({
                "outcome": committed.verification_state(),
                "reason": reason,
            }))
            .emit();
        Ok(())
    }
}
