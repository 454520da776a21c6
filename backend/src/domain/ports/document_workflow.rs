//! Driving port for identity-scoped document use-cases.

use async_trait::async_trait;

use crate::domain::{AccountId, Document, DocumentId, DocumentUpload, Error, ProcessingResult};

/// Domain use-case port for uploading and processing documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentWorkflow: Send + Sync {
    /// Store the upload and record a new `UPLOADED` document.
    async fn upload(&self, owner: &AccountId, upload: DocumentUpload) -> Result<Document, Error>;

    /// Documents owned by `owner`, newest first.
    async fn list(&self, owner: &AccountId) -> Result<Vec<Document>, Error>;

    /// Start processing, or return the document unchanged if already
    /// processing or completed.
    async fn trigger_processing(&self, owner: &AccountId, id: DocumentId)
    -> Result<Document, Error>;

    /// Current state of an owned document.
    async fn status(&self, owner: &AccountId, id: DocumentId) -> Result<Document, Error>;

    /// Result of a completed, owned document.
    async fn result(&self, owner: &AccountId, id: DocumentId) -> Result<ProcessingResult, Error>;
}
