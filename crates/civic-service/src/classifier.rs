//! Image classifier contract and HTTP client
//!
//! The classifier is a black box: it receives the stored image bytes and
//! the issue category, and answers with a trust score in [0, 100] plus an
//! optional explanation payload. Any other answer is a failure.

use async_trait::async_trait;
use civic_core::{CivicError, IssueCategory, TrustScore};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Default bound on a single classifier call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("no classifier is configured")]
    NotConfigured,

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("classifier returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("classifier unreachable: {0}")]
    Transport(String),

    #[error("classifier response violates contract: {0}")]
    Contract(String),
}

impl From<ClassifierError> for CivicError {
    fn from(err: ClassifierError) -> Self {
        CivicError::Classifier(err.to_string())
    }
}

/// A well-formed classifier answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub trust_score: TrustScore,
    /// Opaque payload passed through to the caller
    pub explanation: Option<Value>,
}

impl Classification {
    /// Validate a raw response body against the contract
    pub fn from_value(body: Value) -> Result<Self, ClassifierError> {
        let Value::Object(mut fields) = body else {
            return Err(ClassifierError::Contract("response is not an object".to_string()));
        };

        let raw = fields
            .get("trust_score")
            .ok_or_else(|| ClassifierError::Contract("missing trust_score".to_string()))?;
        let score = raw
            .as_f64()
            .ok_or_else(|| ClassifierError::Contract(format!("trust_score {raw} is not a number")))?;
        let trust_score = TrustScore::new(score)
            .map_err(|_| ClassifierError::Contract(format!("trust_score {score} outside [0, 100]")))?;

        Ok(Self {
            trust_score,
            explanation: fields.remove("explanation").filter(|v| !v.is_null()),
        })
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        image: &[u8],
        category: IssueCategory,
    ) -> Result<Classification, ClassifierError>;
}

/// Classifier reached over HTTP: `POST {base}/analyze?issue_type=<category>`
/// with the raw image as `application/octet-stream`.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    analyze_url: String,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            analyze_url: format!("{}/analyze", base_url.as_ref().trim_end_matches('/')),
            timeout,
        })
    }

    pub fn analyze_url(&self) -> &str {
        &self.analyze_url
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        image: &[u8],
        category: IssueCategory,
    ) -> Result<Classification, ClassifierError> {
        let response = self
            .client
            .post(&self.analyze_url)
            .query(&[("issue_type", category.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout)
                } else {
                    ClassifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(error = %e, "classifier error body unreadable");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout(self.timeout)
            } else {
                ClassifierError::Contract(e.to_string())
            }
        })?;
        Classification::from_value(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_accepts_score_and_explanation() {
        let c = Classification::from_value(json!({
            "trust_score": 72.5,
            "explanation": { "labels": ["smoke"] }
        }))
        .unwrap();
        assert_eq!(c.trust_score.value(), 72.5);
        assert_eq!(c.explanation.unwrap()["labels"][0], "smoke");
    }

    #[test]
    fn test_contract_explanation_optional() {
        let c = Classification::from_value(json!({ "trust_score": 0 })).unwrap();
        assert_eq!(c.trust_score.value(), 0.0);
        assert!(c.explanation.is_none());
    }

    #[test]
    fn test_contract_violations() {
        for body in [
            json!([]),
            json!({}),
            json!({ "trust_score": "high" }),
            json!({ "trust_score": 101 }),
            json!({ "trust_score": -3 }),
            json!({ "trust_score": null }),
        ] {
            assert!(
                matches!(Classification::from_value(body.clone()), Err(ClassifierError::Contract(_))),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn test_analyze_url_normalized() {
        let c = HttpClassifier::new("http://classifier:7000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(c.analyze_url(), "http://classifier:7000/analyze");
    }

    #[test]
    fn test_error_maps_to_classifier() {
        let err: CivicError = ClassifierError::Timeout(Duration::from_secs(30)).into();
        assert!(matches!(err, CivicError::Classifier(_)));
    }
}
