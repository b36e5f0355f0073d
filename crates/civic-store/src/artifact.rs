//! Image artifact storage and upload acceptance
use async_trait::async_trait;
use chrono::Utc;
use civic_core::{ArtifactRef, CivicError, CivicResult};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

/// 10 MiB
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// An uploaded file before acceptance
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An upload that passed the image rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Extension and content type must both name jpeg/jpg/png/gif and the
    /// payload must be non-empty and at most [`MAX_IMAGE_BYTES`].
    pub fn accept(self) -> CivicResult<AcceptedImage> {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| ALLOWED_TYPES.contains(&ext.as_str()))
            .ok_or_else(|| CivicError::validation("Only image files are allowed"))?;

        let mime = self.content_type.to_ascii_lowercase();
        let mime_ok = mime
            .strip_prefix("image/")
            .is_some_and(|subtype| ALLOWED_TYPES.contains(&subtype));
        if !mime_ok {
            return Err(CivicError::validation("Only image files are allowed"));
        }

        if self.bytes.is_empty() {
            return Err(CivicError::validation("Image is required"));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(CivicError::validation(format!(
                "Image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }

        Ok(AcceptedImage {
            extension,
            bytes: self.bytes,
        })
    }
}

/// Generated artifact name: `<millis>-<random>.<ext>`
pub fn artifact_name(extension: &str) -> ArtifactRef {
    let random = Uuid::new_v4().as_u128() % 1_000_000_000;
    ArtifactRef(format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        random,
        extension
    ))
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, image: AcceptedImage) -> CivicResult<ArtifactRef>;

    /// `NotFound` when the artifact is missing.
    async fn get(&self, artifact: &ArtifactRef) -> CivicResult<Vec<u8>>;

    /// Missing artifacts are not an error.
    async fn delete(&self, artifact: &ArtifactRef) -> CivicResult<()>;
}

/// Artifacts as files in one directory
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open (creating if needed) the artifact directory
    pub async fn open(root: impl Into<PathBuf>) -> CivicResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| CivicError::Persistence(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }

    fn path_of(&self, artifact: &ArtifactRef) -> CivicResult<PathBuf> {
        let name = artifact.0.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(CivicError::not_found(format!("artifact {name}")));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, image: AcceptedImage) -> CivicResult<ArtifactRef> {
        let artifact = artifact_name(&image.extension);
        let path = self.path_of(&artifact)?;
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| CivicError::Persistence(format!("{}: {e}", path.display())))?;
        tracing::debug!(artifact = %artifact, bytes = image.bytes.len(), "artifact stored");
        Ok(artifact)
    }

    async fn get(&self, artifact: &ArtifactRef) -> CivicResult<Vec<u8>> {
        let path = self.path_of(artifact)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => CivicError::not_found("Image file not found"),
            _ => CivicError::Persistence(format!("{}: {e}", path.display())),
        })
    }

    async fn delete(&self, artifact: &ArtifactRef) -> CivicResult<()> {
        let path = self.path_of(artifact)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CivicError::Persistence(format!("{}: {e}", path.display()))),
        }
    }
}

/// Artifacts held in memory
#[derive(Default)]
pub struct MemoryArtifactStore {
    files: RwLock<HashMap<ArtifactRef, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, image: AcceptedImage) -> CivicResult<ArtifactRef> {
        let artifact = artifact_name(&image.extension);
        self.files.write().await.insert(artifact.clone(), image.bytes);
        Ok(artifact)
    }

    async fn get(&self, artifact: &ArtifactRef) -> CivicResult<Vec<u8>> {
        self.files
            .read()
            .await
            .get(artifact)
            .cloned()
            .ok_or_else(|| CivicError::not_found("Image file not found"))
    }

    async fn delete(&self, artifact: &ArtifactRef) -> CivicResult<()> {
        self.files.write().await.remove(artifact);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: mime.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_accepts_images() {
        let accepted = upload("pothole.JPG", "image/jpeg", b"\xff\xd8\xff").accept().unwrap();
        assert_eq!(accepted.extension, "jpg");
        assert!(upload("a.png", "image/png", b"x").accept().is_ok());
        assert!(upload("a.gif", "image/gif", b"x").accept().is_ok());
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(upload("notes.txt", "text/plain", b"x").accept().is_err());
        assert!(upload("photo.jpg", "application/pdf", b"x").accept().is_err());
        assert!(upload("photo", "image/jpeg", b"x").accept().is_err());
        assert!(upload("photo.jpg", "image/jpeg", b"").accept().is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        let bytes = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            upload("big.png", "image/png", &bytes).accept(),
            Err(CivicError::Validation(_))
        ));
    }

    #[test]
    fn test_artifact_name_shape() {
        let name = artifact_name("png");
        assert!(name.0.ends_with(".png"));
        assert!(!name.0.contains('/'));
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryArtifactStore::new();
        let image = upload("a.png", "image/png", b"png-bytes").accept().unwrap();
        let artifact = store.put(image).await.unwrap();
        assert_eq!(store.get(&artifact).await.unwrap(), b"png-bytes");

        store.delete(&artifact).await.unwrap();
        assert!(matches!(store.get(&artifact).await, Err(CivicError::NotFound(_))));
        assert!(store.is_empty().await);
    }
}
