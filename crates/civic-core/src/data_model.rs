//! Data Model: Report, Authority and the closed enumerations they carry
use crate::error::{CivicError, CivicResult};
use crate::tracking::TrackingCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Internal report id. Never shown on the public tracking surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ReportId {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CivicError::not_found(format!("report {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorityId(pub Uuid);

impl AuthorityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuthorityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Issue category of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Pothole,
    RoadBlock,
    Garbage,
    Accident,
    WaterLeak,
    Fire,
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 7] = [
        IssueCategory::Pothole,
        IssueCategory::RoadBlock,
        IssueCategory::Garbage,
        IssueCategory::Accident,
        IssueCategory::WaterLeak,
        IssueCategory::Fire,
        IssueCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Pothole => "pothole",
            IssueCategory::RoadBlock => "road_block",
            IssueCategory::Garbage => "garbage",
            IssueCategory::Accident => "accident",
            IssueCategory::WaterLeak => "water_leak",
            IssueCategory::Fire => "fire",
            IssueCategory::Other => "other",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueCategory {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CivicError::validation(format!("unknown issue type '{wanted}'")))
    }
}

/// Postal or administrative code used to scope authority access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    const MAX_LEN: usize = 16;

    pub fn new(raw: impl AsRef<str>) -> CivicResult<Self> {
        let code = raw.as_ref().trim();
        if code.is_empty() {
            return Err(CivicError::validation("region is required"));
        }
        if code.len() > Self::MAX_LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ' ')
        {
            return Err(CivicError::validation(format!("malformed region code '{code}'")));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegionCode {
    type Error = CivicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> CivicResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CivicError::validation(format!("latitude {latitude} out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CivicError::validation(format!("longitude {longitude} out of range")));
        }
        Ok(Self { latitude, longitude })
    }
}

/// Classifier confidence in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TrustScore(f64);

impl TrustScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> CivicResult<Self> {
        if value.is_finite() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CivicError::InvalidState(format!(
                "trust score {value} outside [0, 100]"
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for TrustScore {
    type Error = CivicError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrustScore> for f64 {
    fn from(score: TrustScore) -> Self {
        score.0
    }
}

/// Coarse urgency bucket derived from the severity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
    /// No successful verification yet
    #[default]
    Unknown,
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PriorityTier::Low => write!(f, "LOW"),
            PriorityTier::Medium => write!(f, "MEDIUM"),
            PriorityTier::High => write!(f, "HIGH"),
            PriorityTier::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl FromStr for PriorityTier {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(PriorityTier::Low),
            "MEDIUM" => Ok(PriorityTier::Medium),
            "HIGH" => Ok(PriorityTier::High),
            "UNKNOWN" => Ok(PriorityTier::Unknown),
            other => Err(CivicError::InvalidState(format!("unknown priority '{other}'"))),
        }
    }
}

/// Lifecycle of the external classification step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationState {
    Pending,
    Completed,
    Failed,
    /// No classifier was configured when the report was submitted
    Unavailable,
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerificationState::Pending => write!(f, "PENDING"),
            VerificationState::Completed => write!(f, "COMPLETED"),
            VerificationState::Failed => write!(f, "FAILED"),
            VerificationState::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}

/// Lifecycle of the operational handling of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResolutionState {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl ResolutionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionState::Pending => "Pending",
            ResolutionState::InProgress => "In Progress",
            ResolutionState::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionState {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ResolutionState::Pending),
            "In Progress" => Ok(ResolutionState::InProgress),
            "Resolved" => Ok(ResolutionState::Resolved),
            other => Err(CivicError::InvalidState(format!("invalid status '{other}'"))),
        }
    }
}

/// Fields derived from one successful classification. They only ever travel together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub trust_score: TrustScore,
    pub severity_score: u8,
    pub priority: PriorityTier,
}

/// Name of a stored image artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(pub String);

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A geolocated civic issue report.
///
/// Fields are private: identity is fixed at [`Report::submit`](crate::lifecycle)
/// and the verification and resolution axes only move through the lifecycle
/// transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub(crate) id: ReportId,
    pub(crate) tracking_code: TrackingCode,
    pub(crate) issue_type: IssueCategory,
    pub(crate) description: String,
    pub(crate) region: RegionCode,
    pub(crate) address: String,
    pub(crate) coordinates: Option<Coordinates>,
    pub(crate) geohash: String,
    pub(crate) image: ArtifactRef,
    pub(crate) verification_state: VerificationState,
    pub(crate) assessment: Option<Assessment>,
    pub(crate) resolution: ResolutionState,
    pub(crate) created_at: DateTime<Utc>,
}

impl Report {
    pub fn id(&self) -> ReportId {
        self.id
    }

    pub fn tracking_code(&self) -> &TrackingCode {
        &self.tracking_code
    }

    pub fn issue_type(&self) -> IssueCategory {
        self.issue_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn region(&self) -> &RegionCode {
        &self.region
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn geohash(&self) -> &str {
        &self.geohash
    }

    pub fn image(&self) -> &ArtifactRef {
        &self.image
    }

    pub fn verification_state(&self) -> VerificationState {
        self.verification_state
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    pub fn trust_score(&self) -> Option<f64> {
        self.assessment.map(|a| a.trust_score.value())
    }

    pub fn severity_score(&self) -> Option<u8> {
        self.assessment.map(|a| a.severity_score)
    }

    pub fn priority(&self) -> PriorityTier {
        self.assessment.map(|a| a.priority).unwrap_or_default()
    }

    pub fn resolution(&self) -> ResolutionState {
        self.resolution
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Authority,
    Admin,
}

/// A principal that can act on reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authority {
    pub id: AuthorityId,
    /// Lower-cased, trimmed, unique
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Empty for a plain authority means no access
    #[serde(default)]
    pub assigned_regions: BTreeSet<RegionCode>,
    pub created_at: DateTime<Utc>,
}

impl Authority {
    pub fn new(email: impl AsRef<str>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: AuthorityId::new(),
            email: normalize_email(email.as_ref()),
            name: name.into(),
            role,
            assigned_regions: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_region(mut self, region: RegionCode) -> Self {
        self.assigned_regions.insert(region);
        self
    }

    pub fn with_regions(mut self, regions: impl IntoIterator<Item = RegionCode>) -> Self {
        self.assigned_regions.extend(regions);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
