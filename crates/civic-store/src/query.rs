//! Report listing queries
use civic_core::{PriorityTier, Report, ResolutionState};
use civic_policy::RegionConstraint;
use serde::Serialize;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

/// A filtered, paginated report listing. Region scoping comes from access control.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub regions: RegionConstraint,
    pub resolution: Option<ResolutionState>,
    pub priority: Option<PriorityTier>,
    pub limit: usize,
    pub skip: usize,
}

impl ReportQuery {
    pub fn new(regions: RegionConstraint) -> Self {
        Self {
            regions,
            resolution: None,
            priority: None,
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }

    pub fn with_resolution(mut self, resolution: ResolutionState) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_priority(mut self, priority: PriorityTier) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Page window; the limit is capped at [`MAX_LIMIT`]
    pub fn page(mut self, limit: usize, skip: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self.skip = skip;
        self
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.regions.permits(report.region())
            && self.resolution.map_or(true, |r| report.resolution() == r)
            && self.priority.map_or(true, |p| report.priority() == p)
    }
}

/// One page of results plus the total match count before pagination
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
