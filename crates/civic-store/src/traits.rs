//! Storage backend traits.
use crate::query::{Page, ReportQuery};
use async_trait::async_trait;
use civic_core::{
    Authority, AuthorityId, CivicResult, Report, ReportId, ResolutionState, TrackingCode,
    VerificationUpdate,
};

/// The report collection: keyed by id, unique index on tracking code,
/// secondary index on region.
///
/// Every mutating method applies its change as a single write: a reader
/// never observes a partially updated report.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Store a new report. `Conflict` if the tracking code is taken.
    async fn insert(&self, report: Report) -> CivicResult<()>;

    /// `NotFound` for an unknown id.
    async fn get(&self, id: ReportId) -> CivicResult<Report>;

    /// `NotFound` for an unknown code.
    async fn find_by_tracking_code(&self, code: &TrackingCode) -> CivicResult<Report>;

    /// Newest first.
    async fn list(&self, query: &ReportQuery) -> CivicResult<Page<Report>>;

    async fn set_resolution(&self, id: ReportId, state: ResolutionState) -> CivicResult<Report>;

    /// Commit a verification outcome (state plus derived fields) atomically.
    async fn commit_verification(
        &self,
        id: ReportId,
        update: VerificationUpdate,
    ) -> CivicResult<Report>;
}

/// The authority collection: keyed by id, unique index on email.
#[async_trait]
pub trait AuthorityStore: Send + Sync {
    async fn get_authority(&self, id: AuthorityId) -> CivicResult<Authority>;

    /// Lookup by (normalized) email.
    async fn find_by_email(&self, email: &str) -> CivicResult<Option<Authority>>;

    /// `Conflict` if the email is taken.
    async fn insert_authority(&self, authority: Authority) -> CivicResult<()>;
}
