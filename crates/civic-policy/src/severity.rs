//! Severity scoring for reports
//!
//! Derives a severity score and priority tier from the issue category and
//! the classifier's trust score. Pure: same input, same output.

use civic_core::{Assessment, CivicError, IssueCategory, PriorityTier, TrustScore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeverityError {
    #[error("trust score {0} outside [0, 100]")]
    TrustScoreOutOfRange(f64),
}

impl From<SeverityError> for CivicError {
    fn from(err: SeverityError) -> Self {
        CivicError::InvalidState(err.to_string())
    }
}

/// Map a clamped severity score to its priority tier
pub fn priority_for(severity: u8) -> PriorityTier {
    match severity {
        85..=u8::MAX => PriorityTier::High,
        60..=84 => PriorityTier::Medium,
        _ => PriorityTier::Low,
    }
}

/// Discount applied when the trust score falls below `below`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustBand {
    /// Exclusive upper bound of the band
    pub below: f64,
    pub discount: u8,
    /// Category-independent minimum for this band
    pub floor: u8,
}

/// Result of a severity derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub trust_score: TrustScore,
    /// Category weight before any trust discount
    pub base_severity: u8,
    /// Final score (0-100)
    pub severity_score: u8,
    pub priority: PriorityTier,
    /// The band that discounted the score, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<TrustBand>,
    pub explanation: String,
}

impl SeverityAssessment {
    /// The derived fields as stored on a report
    pub fn to_assessment(&self) -> Assessment {
        Assessment {
            trust_score: self.trust_score,
            severity_score: self.severity_score,
            priority: self.priority,
        }
    }
}

/// Severity engine with configurable weights
#[derive(Debug, Clone)]
pub struct SeverityEngine {
    /// Base severity by category
    pub category_weights: HashMap<IssueCategory, u8>,
    /// Used when a category has no weight in the table
    pub fallback_weight: u8,
    /// Checked in order; the first band whose bound exceeds the trust score applies
    pub trust_bands: Vec<TrustBand>,
}

impl Default for SeverityEngine {
    fn default() -> Self {
        let mut category_weights = HashMap::new();
        category_weights.insert(IssueCategory::Fire, 95);
        category_weights.insert(IssueCategory::Accident, 90);
        category_weights.insert(IssueCategory::RoadBlock, 80);
        category_weights.insert(IssueCategory::WaterLeak, 70);
        category_weights.insert(IssueCategory::Pothole, 60);
        category_weights.insert(IssueCategory::Garbage, 50);
        category_weights.insert(IssueCategory::Other, 40);

        Self {
            category_weights,
            fallback_weight: 40,
            trust_bands: vec![
                TrustBand { below: 40.0, discount: 30, floor: 20 },
                TrustBand { below: 60.0, discount: 15, floor: 30 },
                TrustBand { below: 80.0, discount: 5, floor: 40 },
            ],
        }
    }
}

impl SeverityEngine {
    pub fn base_severity(&self, category: IssueCategory) -> u8 {
        self.category_weights
            .get(&category)
            .copied()
            .unwrap_or(self.fallback_weight)
    }

    /// Derive severity and priority for a category at a given trust score.
    ///
    /// A trust score outside [0, 100] is rejected rather than clamped.
    pub fn derive(
        &self,
        category: IssueCategory,
        trust_score: f64,
    ) -> Result<SeverityAssessment, SeverityError> {
        let trust = TrustScore::new(trust_score)
            .map_err(|_| SeverityError::TrustScoreOutOfRange(trust_score))?;

        let base_severity = self.base_severity(category);
        let band = self
            .trust_bands
            .iter()
            .find(|band| trust_score < band.below)
            .copied();

        let discounted = match band {
            Some(band) => base_severity.saturating_sub(band.discount).max(band.floor),
            None => base_severity,
        };
        let severity_score = discounted.min(100);
        let priority = priority_for(severity_score);

        let explanation = match band {
            Some(band) => format!(
                "{category} base {base_severity}, trust {trust_score} below {} (-{}, floor {}) -> {severity_score} {priority}",
                band.below, band.discount, band.floor
            ),
            None => format!(
                "{category} base {base_severity}, trust {trust_score} undiscounted -> {severity_score} {priority}"
            ),
        };

        Ok(SeverityAssessment {
            trust_score: trust,
            base_severity,
            severity_score,
            priority,
            band,
            explanation,
        })
    }
}

/// Convenience function using the default weights
pub fn derive(
    category: IssueCategory,
    trust_score: f64,
) -> Result<SeverityAssessment, SeverityError> {
    SeverityEngine::default().derive(category, trust_score)
}
