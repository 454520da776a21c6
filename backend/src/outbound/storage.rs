//! Filesystem-backed [`FileStorage`] adapter.
//!
//! Uploads are written into a single directory opened once through a
//! `cap-std` capability handle, so every later operation is confined to that
//! directory. Stored names are `<uuid-hex><extension>`; the location handed
//! back to the domain is that bare name.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{FileStorage, FileStorageError};
use crate::domain::{DocumentFilename, StoredFileLocation};

/// Stores uploads under one root directory.
#[derive(Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    dir: Arc<Dir>,
}

impl LocalFileStorage {
    /// Open `root`, creating it when missing.
    ///
    /// # Errors
    /// Returns [`FileStorageError::Io`] when the directory cannot be created
    /// or opened.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FileStorageError> {
        let root = root.into();
        Dir::create_ambient_dir_all(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        let dir = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(|error| io_error(&root, &error))?;
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, FileStorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, FileStorageError> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(|error| FileStorageError::io(format!("storage task failed: {error}")))?
    }
}

fn io_error(path: &Path, error: &io::Error) -> FileStorageError {
    FileStorageError::io(format!("{}: {error}", path.display()))
}

/// Accept only a single plain file name.
fn relative_name(location: &StoredFileLocation) -> Result<PathBuf, FileStorageError> {
    let path = Path::new(location.as_ref());
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(PathBuf::from(name)),
        _ => Err(FileStorageError::invalid_location(location.as_ref())),
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(
        &self,
        filename: &DocumentFilename,
        bytes: Vec<u8>,
    ) -> Result<StoredFileLocation, FileStorageError> {
        let name = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            filename.format().extension()
        );
        let root = self.root.clone();
        let stored = name.clone();
        let size = bytes.len();
        self.blocking(move |dir| {
            dir.write(&stored, &bytes)
                .map_err(|error| io_error(&root.join(&stored), &error))
        })
        .await?;
        debug!(location = %name, size, "stored upload");
        StoredFileLocation::new(name).map_err(|error| FileStorageError::io(error.to_string()))
    }

    async fn exists(&self, location: &StoredFileLocation) -> Result<bool, FileStorageError> {
        let name = relative_name(location)?;
        let root = self.root.clone();
        self.blocking(move |dir| match dir.metadata(&name) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(io_error(&root.join(&name), &error)),
        })
        .await
    }

    async fn remove(&self, location: &StoredFileLocation) -> Result<(), FileStorageError> {
        let name = relative_name(location)?;
        let root = self.root.clone();
        self.blocking(move |dir| match dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&root.join(&name), &error)),
        })
        .await?;
        debug!(location = %location, "removed upload");
        Ok(())
    }
}
