//! Report Lifecycle: submission and the two orthogonal state axes
//!
//! ```text
//! verification:  PENDING ──► COMPLETED ◄─┐
//!                   │                     ├─ re-verify
//!                   └──────► FAILED ◄─────┘
//!                UNAVAILABLE (decided at submission, terminal)
//!
//! resolution:    Pending ──► In Progress ──► Resolved
//!                   └──────────────────────────▲
//! ```
use crate::data_model::{
    ArtifactRef, Assessment, Coordinates, IssueCategory, RegionCode, Report, ReportId,
    ResolutionState, VerificationState,
};
use crate::error::{CivicError, CivicResult};
use crate::geohash;
use crate::tracking::TrackingCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw, untrusted submission fields as they arrive from a form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub issue_type: Option<String>,
    #[serde(alias = "pincode")]
    pub region: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// Submission fields after validation
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub issue_type: IssueCategory,
    pub region: RegionCode,
    pub address: String,
    pub description: String,
    pub coordinates: Option<Coordinates>,
}

impl SubmissionForm {
    pub fn validate(self) -> CivicResult<Submission> {
        let missing = || CivicError::validation("Issue type, pincode, and address are required");

        let issue_type = non_blank(self.issue_type).ok_or_else(missing)?;
        let region = non_blank(self.region).ok_or_else(missing)?;
        let address = non_blank(self.address).ok_or_else(missing)?;

        let coordinates = match (non_blank(self.latitude), non_blank(self.longitude)) {
            (None, None) => None,
            (Some(lat), Some(lng)) => Some(Coordinates::new(
                parse_coordinate("latitude", &lat)?,
                parse_coordinate("longitude", &lng)?,
            )?),
            _ => {
                return Err(CivicError::validation(
                    "latitude and longitude must be given together",
                ))
            }
        };

        Ok(Submission {
            issue_type: issue_type.parse()?,
            region: RegionCode::new(region)?,
            address,
            description: self.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            coordinates,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_coordinate(field: &str, raw: &str) -> CivicResult<f64> {
    raw.parse::<f64>()
        .map_err(|_| CivicError::validation(format!("{field} '{raw}' is not a number")))
}

/// Outcome of one verification attempt, committed as a single write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerificationUpdate {
    Completed(Assessment),
    /// Previous derived fields, if any, are kept
    Failed,
}

impl VerificationUpdate {
    pub fn state(&self) -> VerificationState {
        match self {
            VerificationUpdate::Completed(_) => VerificationState::Completed,
            VerificationUpdate::Failed => VerificationState::Failed,
        }
    }
}

impl Report {
    /// Create a report from a validated submission.
    ///
    /// The verification axis starts at PENDING when a classifier is configured
    /// and at UNAVAILABLE otherwise; the resolution axis always starts at Pending.
    pub fn submit(
        submission: Submission,
        image: ArtifactRef,
        tracking_code: TrackingCode,
        classifier_configured: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let geohash = submission
            .coordinates
            .map(|c| geohash::encode(c, geohash::REPORT_PRECISION))
            .unwrap_or_default();

        Self {
            id: ReportId::new(),
            tracking_code,
            issue_type: submission.issue_type,
            description: submission.description,
            region: submission.region,
            address: submission.address,
            coordinates: submission.coordinates,
            geohash,
            image,
            verification_state: if classifier_configured {
                VerificationState::Pending
            } else {
                VerificationState::Unavailable
            },
            assessment: None,
            resolution: ResolutionState::Pending,
            created_at: now,
        }
    }

    /// Replace the tracking code after a uniqueness conflict, before the report is stored.
    pub fn reissue_tracking_code(&mut self, tracking_code: TrackingCode) {
        self.tracking_code = tracking_code;
    }

    /// Overwrite the resolution state. Authorization is the caller's job.
    pub fn set_resolution(&mut self, state: ResolutionState) {
        self.resolution = state;
    }

    /// Whether a verification run may start from the current state.
    pub fn ensure_verifiable(&self) -> CivicResult<()> {
        match self.verification_state {
            VerificationState::Pending
            | VerificationState::Completed
            | VerificationState::Failed => Ok(()),
            VerificationState::Unavailable => Err(CivicError::InvalidState(format!(
                "report {} was submitted without a classifier and cannot be verified",
                self.tracking_code
            ))),
        }
    }

    /// Apply a verification outcome. All derived fields change together or not at all.
    pub fn apply_verification(&mut self, update: VerificationUpdate) -> CivicResult<()> {
        self.ensure_verifiable()?;
        if let VerificationUpdate::Completed(assessment) = update {
            self.assessment = Some(assessment);
        }
        self.verification_state = update.state();
        Ok(())
    }
}
