//! In-memory document store
use crate::query::{Page, ReportQuery};
use crate::traits::{AuthorityStore, ReportStore};
use async_trait::async_trait;
use civic_core::data_model::normalize_email;
use civic_core::{
    Authority, AuthorityId, CivicError, CivicResult, RegionCode, Report, ReportId,
    ResolutionState, TrackingCode, VerificationUpdate,
};
use civic_policy::RegionConstraint;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Reports {
    by_id: HashMap<ReportId, Report>,
    by_tracking_code: HashMap<TrackingCode, ReportId>,
    by_region: HashMap<RegionCode, BTreeSet<ReportId>>,
}

#[derive(Default)]
struct Authorities {
    by_id: HashMap<AuthorityId, Authority>,
    by_email: HashMap<String, AuthorityId>,
}

/// Both collections behind one process-local lock each.
#[derive(Default)]
pub struct MemoryStore {
    reports: RwLock<Reports>,
    authorities: RwLock<Authorities>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn report_count(&self) -> usize {
        self.reports.read().await.by_id.len()
    }
}

fn report_not_found(id: ReportId) -> CivicError {
    CivicError::not_found(format!("report {id}"))
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert(&self, report: Report) -> CivicResult<()> {
        let mut reports = self.reports.write().await;
        if reports.by_tracking_code.contains_key(report.tracking_code()) {
            return Err(CivicError::Conflict(format!(
                "tracking code {} already issued",
                report.tracking_code()
            )));
        }
        if reports.by_id.contains_key(&report.id()) {
            return Err(CivicError::Conflict(format!("report {} exists", report.id())));
        }

        let id = report.id();
        reports
            .by_tracking_code
            .insert(report.tracking_code().clone(), id);
        reports
            .by_region
            .entry(report.region().clone())
            .or_default()
            .insert(id);
        reports.by_id.insert(id, report);
        Ok(())
    }

    async fn get(&self, id: ReportId) -> CivicResult<Report> {
        self.reports
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| report_not_found(id))
    }

    async fn find_by_tracking_code(&self, code: &TrackingCode) -> CivicResult<Report> {
        let reports = self.reports.read().await;
        reports
            .by_tracking_code
            .get(code)
            .and_then(|id| reports.by_id.get(id))
            .cloned()
            .ok_or_else(|| CivicError::not_found(format!("complaint {code}")))
    }

    async fn list(&self, query: &ReportQuery) -> CivicResult<Page<Report>> {
        let reports = self.reports.read().await;

        let mut matched: Vec<&Report> = match &query.regions {
            RegionConstraint::Nothing => return Ok(Page::empty()),
            RegionConstraint::Unconstrained => reports.by_id.values().collect(),
            RegionConstraint::Regions(regions) => regions
                .iter()
                .filter_map(|region| reports.by_region.get(region))
                .flatten()
                .filter_map(|id| reports.by_id.get(id))
                .collect(),
        };
        matched.retain(|report| query.matches(report));
        matched.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.tracking_code().cmp(a.tracking_code()))
        });

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn set_resolution(&self, id: ReportId, state: ResolutionState) -> CivicResult<Report> {
        let mut reports = self.reports.write().await;
        let report = reports.by_id.get_mut(&id).ok_or_else(|| report_not_found(id))?;
        report.set_resolution(state);
        Ok(report.clone())
    }

    async fn commit_verification(
        &self,
        id: ReportId,
        update: VerificationUpdate,
    ) -> CivicResult<Report> {
        let mut reports = self.reports.write().await;
        let report = reports.by_id.get_mut(&id).ok_or_else(|| report_not_found(id))?;
        // Apply to a copy so a rejected update leaves the stored record untouched
        let mut next = report.clone();
        next.apply_verification(update)?;
        *report = next.clone();
        Ok(next)
    }
}

#[async_trait]
impl AuthorityStore for MemoryStore {
    async fn get_authority(&self, id: AuthorityId) -> CivicResult<Authority> {
        self.authorities
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| CivicError::not_found(format!("authority {id}")))
    }

    async fn find_by_email(&self, email: &str) -> CivicResult<Option<Authority>> {
        let authorities = self.authorities.read().await;
        Ok(authorities
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| authorities.by_id.get(id))
            .cloned())
    }

    async fn insert_authority(&self, authority: Authority) -> CivicResult<()> {
        let mut authorities = self.authorities.write().await;
        let email = normalize_email(&authority.email);
        if authorities.by_email.contains_key(&email) {
            return Err(CivicError::Conflict(format!("authority {email} exists")));
        }
        authorities.by_email.insert(email, authority.id);
        authorities.by_id.insert(authority.id, authority);
        Ok(())
    }
}
