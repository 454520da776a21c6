//! Port for storing uploaded file bytes.

use async_trait::async_trait;

use crate::domain::{DocumentFilename, StoredFileLocation};

use super::define_port_error;

define_port_error! {
    /// Errors raised by file storage adapters.
    pub enum FileStorageError {
        /// Reading or writing the backing store failed.
        Io { message: String } => "file storage failed: {message}",
        /// The location does not refer to a file this store manages.
        InvalidLocation { location: String } => "invalid storage location: {location}",
    }
}

/// Port for persisting upload bytes outside the entity store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under a fresh name derived from `filename`'s extension.
    async fn save(
        &self,
        filename: &DocumentFilename,
        bytes: Vec<u8>,
    ) -> Result<StoredFileLocation, FileStorageError>;

    /// Whether the stored file is still present.
    async fn exists(&self, location: &StoredFileLocation) -> Result<bool, FileStorageError>;

    /// Delete a stored file. Removing a missing file succeeds.
    async fn remove(&self, location: &StoredFileLocation) -> Result<(), FileStorageError>;
}
