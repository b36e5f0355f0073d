//! Prometheus counters served at `/metrics`
use civic_core::CivicError;
use civic_service::VerificationOutcome;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct ApiMetrics {
    registry: Registry,
    submitted: IntCounter,
    verifications: IntCounterVec,
    denials: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submitted = IntCounter::new("civic_reports_submitted_total", "Reports accepted")?;
        let verifications = IntCounterVec::new(
            Opts::new("civic_verifications_total", "Verification requests by outcome"),
            &["outcome"],
        )?;
        let denials = IntCounter::new("civic_access_denials_total", "Requests denied by access control")?;

        registry.register(Box::new(submitted.clone()))?;
        registry.register(Box::new(verifications.clone()))?;
        registry.register(Box::new(denials.clone()))?;

        Ok(Self {
            registry,
            submitted,
            verifications,
            denials,
        })
    }

    pub fn report_submitted(&self) {
        self.submitted.inc();
    }

    /// Counted by what the run committed, not by the error it returned
    pub fn verification(&self, outcome: VerificationOutcome) {
        self.verifications.with_label_values(&[outcome.as_str()]).inc();
    }

    /// Count the error if access control produced it
    pub fn observe(&self, err: &CivicError) {
        if matches!(err, CivicError::Authorization(_)) {
            self.denials.inc();
        }
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
