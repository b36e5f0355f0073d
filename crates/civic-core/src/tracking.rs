//! Tracking codes: the externally visible report identifier
use crate::error::{CivicError, CivicResult};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

static TRACKING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CIV-[0-9]{10,16}-[0-9A-Z]{6}$").expect("static pattern"));

const SUFFIX_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `CIV-<unix millis>-<6 base36 chars>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Issue a fresh code. Uniqueness is enforced by the store's index;
    /// callers regenerate on conflict.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut entropy = Uuid::new_v4().as_u128();
        let mut suffix = String::with_capacity(SUFFIX_LEN);
        for _ in 0..SUFFIX_LEN {
            suffix.push(BASE36[(entropy % 36) as usize] as char);
            entropy /= 36;
        }
        Self(format!("CIV-{}-{}", now.timestamp_millis(), suffix))
    }

    pub fn parse(raw: &str) -> CivicResult<Self> {
        let code = raw.trim();
        if TRACKING_CODE.is_match(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(CivicError::not_found(format!("complaint {code}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TrackingCode {
    type Error = CivicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingCode> for String {
    fn from(code: TrackingCode) -> Self {
        code.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generated_code_format() {
        let now = Utc.timestamp_millis_opt(1_718_000_000_000).unwrap();
        let code = TrackingCode::generate(now);
        assert!(code.as_str().starts_with("CIV-1718000000000-"));
        assert_eq!(TrackingCode::parse(code.as_str()).unwrap(), code);
    }

    #[test]
    fn test_generated_codes_differ() {
        let now = Utc::now();
        let a = TrackingCode::generate(now);
        let b = TrackingCode::generate(now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_foreign_shapes() {
        assert!(TrackingCode::parse("CIV-123-ABCDEF").is_err());
        assert!(TrackingCode::parse("CIV-1718000000000-abcdef").is_err());
        assert!(TrackingCode::parse("65f1c0ffee").is_err());
        assert!(TrackingCode::parse(" CIV-1718000000000-0A9XQZ ").is_ok());
    }
}
