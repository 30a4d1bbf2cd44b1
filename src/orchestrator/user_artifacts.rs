//! User-uploaded artifact storage.
//!
//! Each upload gets its own directory under the root, named by the
//! configured name factory. Construction does no I/O; directories are created
//! on demand.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Produces directory names for new uploads. Must not repeat.
pub type NameFactory = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("User artifacts root directory is empty")]
    EmptyRoot,

    #[error("Invalid artifact name {0:?}")]
    InvalidName(String),

    #[error("Upload directory {0} not found")]
    DirNotFound(String),

    #[error("Upload directory {0} already exists")]
    DirExists(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub struct UserArtifactsOptions {
    pub root_dir: PathBuf,
    pub name_factory: NameFactory,
}

impl UserArtifactsOptions {
    /// Options using random UUIDs as directory names.
    pub fn with_uuid_names(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            name_factory: Arc::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }
}

pub struct UserArtifactsManager {
    root_dir: PathBuf,
    name_factory: NameFactory,
}

impl std::fmt::Debug for UserArtifactsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserArtifactsManager")
            .field("root_dir", &self.root_dir)
            .finish_non_exhaustive()
    }
}

impl UserArtifactsManager {
    pub fn new(opts: UserArtifactsOptions) -> Result<Self, ArtifactError> {
        if opts.root_dir.as_os_str().is_empty() {
            return Err(ArtifactError::EmptyRoot);
        }
        Ok(Self {
            root_dir: opts.root_dir,
            name_factory: opts.name_factory,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Create a fresh upload directory and return its name.
    pub async fn create_dir(&self) -> Result<String, ArtifactError> {
        let name = (self.name_factory)();
        validate_name(&name)?;

        tokio::fs::create_dir_all(&self.root_dir).await?;
        match tokio::fs::create_dir(self.root_dir.join(&name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ArtifactError::DirExists(name));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(dir = %name, "User artifacts directory created");
        Ok(name)
    }

    /// Names of existing upload directories, sorted.
    pub async fn list_dirs(&self) -> Result<Vec<String>, ArtifactError> {
        let mut entries = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Stream `body` into `file` inside the upload directory `dir`.
    ///
    /// Chunks are written as they arrive. A failed upload leaves no partial
    /// file behind.
    pub async fn write_file<S, E>(&self, dir: &str, file: &str, body: S) -> Result<u64, ArtifactError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        validate_name(dir)?;
        validate_name(file)?;

        let dir_path = self.root_dir.join(dir);
        if !tokio::fs::try_exists(&dir_path).await? {
            return Err(ArtifactError::DirNotFound(dir.to_string()));
        }

        let path = dir_path.join(file);
        let written = match copy_to_file(&path, body).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }
        };

        tracing::debug!(dir = %dir, file = %file, bytes = written, "User artifact written");
        Ok(written)
    }
}

async fn copy_to_file<S, E>(path: &Path, mut body: S) -> io::Result<u64>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut out = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;
    Ok(written)
}

fn validate_name(name: &str) -> Result<(), ArtifactError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    Ok(())
}
