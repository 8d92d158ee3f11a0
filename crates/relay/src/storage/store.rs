//! [`ImageStore`]: flat directory of uploaded images.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use super::kind::ImageKind;

/// Longest stem kept from the uploader's filename.
const MAX_STEM_LEN: usize = 64;

/// Longest stored filename accepted by [`ImageStore::resolve`].
const MAX_NAME_LEN: usize = 255;

/// Name collisions tolerated before giving up on an upload.
const SAVE_ATTEMPTS: u64 = 16;

/// Errors produced by the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The name is not a single plain filename.
    #[error("invalid stored filename")]
    InvalidName,

    /// No regular file exists under that name.
    #[error("file not found")]
    NotFound,

    /// Every candidate name was already taken.
    #[error("could not allocate a unique filename")]
    Exhausted,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to the upload directory.
///
/// Cheap to clone; all clones refer to the same root.
#[derive(Clone, Debug)]
pub struct ImageStore {
    root: Arc<PathBuf>,
}

impl ImageStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if the root still exists and is a directory.
    pub async fn is_ready(&self) -> bool {
        fs::metadata(self.root.as_path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Persist `data` under a fresh server-chosen name and return that name.
    ///
    /// The name is `<stem>-<unix millis>.<ext>`, with the stem taken from the
    /// uploader's filename. Existing files are never overwritten; on a
    /// collision the millisecond component is bumped and the create retried.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Exhausted`] if no free name was found, or
    /// [`StorageError::Io`] if the write fails (the partial file is removed).
    pub async fn save(
        &self,
        original_name: Option<&str>,
        kind: ImageKind,
        data: &[u8],
    ) -> Result<String, StorageError> {
        let stem = sanitize_stem(original_name);
        let millis = now_millis();

        for attempt in 0..SAVE_ATTEMPTS {
            let name = format!("{stem}-{}.{}", millis + attempt, kind.extension());
            let path = self.root.join(&name);
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            let written = async {
                file.write_all(data).await?;
                file.sync_all().await
            }
            .await;
            if let Err(e) = written {
                discard_partial(&path).await;
                return Err(e.into());
            }

            debug!(bytes = data.len(), "image stored");
            return Ok(name);
        }
        Err(StorageError::Exhausted)
    }

    /// Names of all regular files in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be read.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(self.root.as_path()).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Map a stored filename onto its path, if it names an existing file.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidName`] unless `name` is a single plain filename.
    /// - [`StorageError::NotFound`] if nothing, or something other than a
    ///   regular file, exists under that name.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        let path = self.root.join(name);
        match fs::metadata(&path).await {
            Ok(m) if m.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file.
    ///
    /// # Errors
    ///
    /// Same as [`ImageStore::resolve`], plus [`StorageError::Io`] if removal fails.
    pub async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name).await?;
        fs::remove_file(path).await?;
        Ok(())
    }
}

/// Best-effort removal of a half-written upload. A failure is logged, not
/// returned, so the caller still reports the original write error.
async fn discard_partial(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to remove partial upload");
            false
        }
    }
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name.contains(|c| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(StorageError::InvalidName);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(StorageError::InvalidName),
    }
}

fn sanitize_stem(original_name: Option<&str>) -> String {
    let stem: String = original_name
        .and_then(|n| Path::new(n).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(MAX_STEM_LEN)
        .collect();
    if stem.is_empty() {
        "upload".into()
    } else {
        stem
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
