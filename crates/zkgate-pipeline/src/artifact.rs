//! # Artifact Store
//!
//! Staging area for every file that moves between pipeline stages. The
//! store is the only component that constructs filesystem paths: each path
//! it hands out carries a kind-specific prefix and a UUID suffix, so
//! concurrent sessions can never collide and a retried stage never
//! overwrites a prior artifact.
//!
//! The store keeps a registry of every path it has issued. A path is
//! accepted as stage input only if it was issued here, still exists on
//! disk, and is non-empty — re-checked immediately before every use. This
//! is the injection-risk boundary: values arriving over the wire are
//! *looked up* against the registry, never interpolated into a command.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// The kind of file an artifact path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Raw uploaded fingerprint image (TIFF).
    FingerprintImage,
    /// Serialized feature vector produced by preprocessing.
    FeatureVector,
    /// Circuit input JSON built from two feature vectors.
    CircuitInput,
    /// Binary witness produced from the circuit input.
    Witness,
    /// Groth16 proof JSON.
    Proof,
    /// Public-input list JSON.
    PublicInput,
}

impl ArtifactKind {
    /// Filename prefix for artifacts of this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::FingerprintImage => "fingerprint",
            Self::FeatureVector => "features",
            Self::CircuitInput => "circuit-input",
            Self::Witness => "witness",
            Self::Proof => "proof",
            Self::PublicInput => "public",
        }
    }

    /// Filename extension for artifacts of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::FingerprintImage => "tif",
            Self::FeatureVector => "pkl",
            Self::CircuitInput => "json",
            Self::Witness => "wtns",
            Self::Proof => "json",
            Self::PublicInput => "json",
        }
    }

    /// Whether artifacts of this kind are raw uploads rather than stage
    /// outputs. Uploads land in `uploads/`, stage outputs in `work/`.
    fn is_upload(&self) -> bool {
        matches!(self, Self::FingerprintImage)
    }
}

/// Failures validating or reading an artifact path.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The path was not issued by this store. Either it came from outside
    /// the pipeline or the process restarted since it was issued.
    #[error("path was not issued by the artifact store: {0}")]
    NotIssued(String),

    /// The artifact no longer exists on disk.
    #[error("artifact missing from disk: {0}")]
    Missing(String),

    /// The artifact exists but is empty.
    #[error("artifact is empty: {0}")]
    Empty(String),

    /// Filesystem failure.
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Staging store for pipeline artifacts. Owned by the orchestrator.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    issued: RwLock<HashSet<PathBuf>>,
}

impl ArtifactStore {
    /// Open (and create if necessary) a store rooted at `root`, with
    /// `uploads/` and `work/` subdirectories.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("uploads"))?;
        std::fs::create_dir_all(root.join("work"))?;
        Ok(Self {
            root,
            issued: RwLock::new(HashSet::new()),
        })
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a fresh, collision-resistant output path for `kind`.
    ///
    /// The file is not created; the external tool (or executor) writes it.
    /// The path is registered immediately so the producing stage can later
    /// be validated against it.
    pub fn allocate(&self, kind: ArtifactKind) -> PathBuf {
        let dir = if kind.is_upload() { "uploads" } else { "work" };
        let path = self.root.join(dir).join(format!(
            "{}-{}.{}",
            kind.prefix(),
            Uuid::new_v4(),
            kind.extension()
        ));
        self.issued.write().insert(path.clone());
        path
    }

    /// Persist uploaded bytes as a new artifact of `kind`.
    ///
    /// Rejects empty uploads. The upload's original filename is discarded
    /// entirely — only the store-generated path identifies the artifact.
    pub fn save_upload(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        if bytes.is_empty() {
            return Err(ArtifactError::Empty(format!("uploaded {}", kind.prefix())));
        }
        let path = self.allocate(kind);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Validate that `path` was issued by this store and currently holds a
    /// non-empty file. Called immediately before each stage invocation.
    pub fn require(&self, path: &Path) -> Result<(), ArtifactError> {
        if !self.issued.read().contains(path) {
            return Err(ArtifactError::NotIssued(path.display().to_string()));
        }
        let meta = std::fs::metadata(path)
            .map_err(|_| ArtifactError::Missing(path.display().to_string()))?;
        if meta.len() == 0 {
            return Err(ArtifactError::Empty(path.display().to_string()));
        }
        Ok(())
    }

    /// Read a validated artifact into memory.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, ArtifactError> {
        self.require(path)?;
        Ok(std::fs::read(path)?)
    }

    /// Forget an issued path and best-effort delete its file. Called when
    /// the owning session is discarded or submitted, so the registry does
    /// not grow for the process lifetime.
    pub fn release(&self, path: &Path) {
        if self.issued.write().remove(path) {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn allocate_yields_unique_kind_tagged_paths() {
        let (_dir, store) = store();
        let a = store.allocate(ArtifactKind::Witness);
        let b = store.allocate(ArtifactKind::Witness);
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_str().unwrap().starts_with("witness-"));
        assert_eq!(a.extension().unwrap(), "wtns");
        assert!(a.starts_with(store.root().join("work")));
    }

    #[test]
    fn uploads_land_in_uploads_dir() {
        let (_dir, store) = store();
        let path = store
            .save_upload(ArtifactKind::FingerprintImage, b"II*\x00fake-tiff")
            .unwrap();
        assert!(path.starts_with(store.root().join("uploads")));
        assert!(store.require(&path).is_ok());
    }

    #[test]
    fn empty_upload_rejected() {
        let (_dir, store) = store();
        let err = store.save_upload(ArtifactKind::FingerprintImage, b"").unwrap_err();
        assert!(matches!(err, ArtifactError::Empty(_)));
    }

    #[test]
    fn foreign_path_rejected_even_if_it_exists() {
        let (dir, store) = store();
        let foreign = dir.path().join("smuggled.pkl");
        std::fs::write(&foreign, b"data").unwrap();
        let err = store.require(&foreign).unwrap_err();
        assert!(matches!(err, ArtifactError::NotIssued(_)));
    }

    #[test]
    fn issued_but_never_written_is_missing() {
        let (_dir, store) = store();
        let path = store.allocate(ArtifactKind::Proof);
        let err = store.require(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing(_)));
    }

    #[test]
    fn issued_but_empty_is_rejected() {
        let (_dir, store) = store();
        let path = store.allocate(ArtifactKind::CircuitInput);
        std::fs::write(&path, b"").unwrap();
        let err = store.require(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Empty(_)));
    }

    #[test]
    fn released_path_is_no_longer_accepted() {
        let (_dir, store) = store();
        let path = store
            .save_upload(ArtifactKind::FingerprintImage, b"II*\x00fake-tiff")
            .unwrap();
        store.release(&path);
        assert!(!path.exists());
        assert!(matches!(
            store.require(&path).unwrap_err(),
            ArtifactError::NotIssued(_)
        ));
    }

    #[test]
    fn releasing_a_foreign_path_leaves_its_file_alone() {
        let (dir, store) = store();
        let foreign = dir.path().join("outside.json");
        std::fs::write(&foreign, b"data").unwrap();
        store.release(&foreign);
        assert!(foreign.exists());
    }

    #[test]
    fn read_returns_artifact_bytes() {
        let (_dir, store) = store();
        let path = store.save_upload(ArtifactKind::FingerprintImage, b"bytes").unwrap();
        assert_eq!(store.read(&path).unwrap(), b"bytes");
    }
}
