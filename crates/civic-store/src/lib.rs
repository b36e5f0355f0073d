//! Storage for Civic Eye: the report and authority collections, image
//! artifacts, and deployment-time seeding.
//!
//! Backends are behind [`ReportStore`], [`AuthorityStore`] and
//! [`ArtifactStore`]; the shipped implementations are in-memory documents
//! and a directory of image files.

pub mod artifact;
pub mod memory;
pub mod query;
pub mod seed;
pub mod traits;

pub use artifact::{
    AcceptedImage, ArtifactStore, FsArtifactStore, ImageUpload, MemoryArtifactStore,
    MAX_IMAGE_BYTES,
};
pub use memory::MemoryStore;
pub use query::{Page, ReportQuery, DEFAULT_LIMIT, MAX_LIMIT};
pub use seed::{seed_authorities, AuthoritySeed, SeedFile, SeedOutcome};
pub use traits::{AuthorityStore, ReportStore};
