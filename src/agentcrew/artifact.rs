//! Where task `output_file` artifacts go.
//!
//! A task may name an artifact (e.g. `blog-post.md`); after the task completes the runner
//! hands the captured text to the pipeline's [`ArtifactSink`]. The default sink writes into
//! a directory on disk; [`MemoryArtifactSink`] keeps everything in memory for tests and for
//! hosts that serve artifacts themselves.

use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// The logical name is empty, absolute, or escapes the sink's directory.
    InvalidName(String),
    Io { name: String, message: String },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::InvalidName(name) => write!(f, "Invalid artifact name: '{}'", name),
            ArtifactError::Io { name, message } => {
                write!(f, "Failed to write artifact '{}': {}", name, message)
            }
        }
    }
}

impl Error for ArtifactError {}

/// Persists task output under a logical name.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn write(&self, name: &str, content: &str) -> Result<(), ArtifactError>;
}

/// Writes artifacts as files under a base directory. Missing directories are created.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    base_dir: PathBuf,
}

impl FsArtifactSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `name` inside the base directory, rejecting anything that would leave it.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let relative = Path::new(name);
        let is_plain = !name.trim().is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !is_plain {
            return Err(ArtifactError::InvalidName(name.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn write(&self, name: &str, content: &str) -> Result<(), ArtifactError> {
        let path = self.resolve(name)?;
        let io_err = |e: std::io::Error| ArtifactError::Io {
            name: name.to_string(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, content).await.map_err(io_err)?;
        log::info!("FsArtifactSink::write(): wrote {}", path.display());
        Ok(())
    }
}

/// Keeps the latest content written under each name.
#[derive(Debug, Default)]
pub struct MemoryArtifactSink {
    artifacts: Mutex<HashMap<String, String>>,
}

impl MemoryArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        self.artifacts.lock().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.artifacts.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ArtifactSink for MemoryArtifactSink {
    async fn write(&self, name: &str, content: &str) -> Result<(), ArtifactError> {
        if name.trim().is_empty() {
            return Err(ArtifactError::InvalidName(name.to_string()));
        }
        self.artifacts
            .lock()
            .await
            .insert(name.to_string(), content.to_string());
        Ok(())
    }
}
