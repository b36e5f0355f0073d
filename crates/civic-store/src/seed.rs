//! Idempotent authority seeding, run once at deployment
use crate::traits::AuthorityStore;
use civic_core::{Authority, CivicError, CivicResult, RegionCode, Role};
use civic_policy::{AuditEntry, AuditEventType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One authority to ensure exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoritySeed {
    pub email: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default, alias = "assigned_pincodes")]
    pub assigned_regions: Vec<RegionCode>,
    /// Bearer token for the static credential service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_role() -> Role {
    Role::Authority
}

impl AuthoritySeed {
    pub fn to_authority(&self) -> Authority {
        Authority::new(&self.email, self.name.clone(), self.role)
            .with_regions(self.assigned_regions.iter().cloned())
    }
}

/// Contents of a seed file (YAML or JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub authorities: Vec<AuthoritySeed>,
}

impl SeedFile {
    pub fn parse(source: &str) -> CivicResult<Self> {
        serde_yaml::from_str(source)
            .map_err(|e| CivicError::validation(format!("invalid seed file: {e}")))
    }

    pub async fn load(path: impl AsRef<Path>) -> CivicResult<Self> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CivicError::Persistence(format!("{}: {e}", path.display())))?;
        Self::parse(&source)
    }

    /// `(token, email)` pairs for the credential service
    pub fn tokens(&self) -> impl Iterator<Item = (&str, &str)> {
        self.authorities
            .iter()
            .filter_map(|seed| seed.token.as_deref().map(|t| (t, seed.email.as_str())))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Create every seeded authority that does not exist yet.
///
/// Existing authorities (matched by email) are left untouched, so running
/// this again is a no-op.
pub async fn seed_authorities<S>(store: &S, seeds: &[AuthoritySeed]) -> CivicResult<SeedOutcome>
where
    S: AuthorityStore + ?Sized,
{
    let mut outcome = SeedOutcome::default();

    for seed in seeds {
        let authority = seed.to_authority();
        if store.find_by_email(&authority.email).await?.is_some() {
            outcome.existing.push(authority.email);
            continue;
        }

        let email = authority.email.clone();
        match store.insert_authority(authority).await {
            Ok(()) => {
                AuditEntry::new(AuditEventType::Seeding, "seed_authority")
                    .with_actor(&email)
                    .with_context(serde_json::json!({ "role": seed.role }))
                    .emit();
                outcome.created.push(email);
            }
            // Lost a race with a concurrent seeder; same end state
            Err(CivicError::Conflict(_)) => outcome.existing.push(email),
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        created = outcome.created.len(),
        existing = outcome.existing.len(),
        "authorities seeded"
    );
    Ok(outcome)
}
