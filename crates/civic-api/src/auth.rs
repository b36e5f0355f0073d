//! Bearer credential resolution
//!
//! A credential service turns a bearer token into an authority email; the
//! email is then looked up in the authority collection. Any failure along
//! the way is an authentication error.
use crate::error::ApiError;
use crate::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use civic_core::{Authority, CivicError, CivicResult};
use std::collections::HashMap;

#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Email of the authority the token belongs to
    async fn resolve(&self, bearer: &str) -> CivicResult<String>;
}

/// Fixed token table, usually loaded from the seed file
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, email: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), email.into());
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for StaticCredentials {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |creds, (token, email)| creds.with_token(token, email))
    }
}

#[async_trait]
impl CredentialService for StaticCredentials {
    async fn resolve(&self, bearer: &str) -> CivicResult<String> {
        self.tokens
            .get(bearer)
            .cloned()
            .ok_or_else(|| CivicError::Authentication("Invalid token".to_string()))
    }
}

/// The authenticated authority behind a request
#[derive(Debug, Clone)]
pub struct CurrentAuthority(pub Authority);

impl FromRequestParts<AppState> for CurrentAuthority {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| CivicError::Authentication("Missing bearer token".to_string()))?;

        let email = state.credentials.resolve(token).await?;
        let authority = state
            .authorities
            .find_by_email(&email)
            .await?
            .ok_or_else(|| {
                tracing::warn!(%email, "token resolves to an unknown authority");
                CivicError::Authentication("Unknown authority".to_string())
            })?;

        Ok(Self(authority))
    }
}
