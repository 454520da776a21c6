//! Owner-scoped document use-cases.
//!
//! Uploads are validated in full before any bytes are written, and the stored
//! file is removed again if the document cannot be recorded. Triggering
//! processing commits `PROCESSING` through [`DocumentLifecycle`] first and
//! only then submits the job, so a status read right after a trigger always
//! observes at least `PROCESSING`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::domain::ports::{DocumentWorkflow, FileStorage, ProcessingQueue};
use crate::domain::{
    AccountId, BeginProcessing, Document, DocumentFilename, DocumentFormat, DocumentId,
    DocumentLifecycle, DocumentStatus, Error, ProcessingJob, ProcessingResult,
};

/// Default upper bound on upload size (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Raw upload as received by an inbound adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// Client-supplied filename.
    pub filename: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Document service implementing the [`DocumentWorkflow`] driving port.
#[derive(Clone)]
pub struct DocumentServiceImpl {
    lifecycle: DocumentLifecycle,
    storage: Arc<dyn FileStorage>,
    queue: Arc<dyn ProcessingQueue>,
    max_upload_bytes: usize,
}

impl DocumentServiceImpl {
    /// Service rejecting bodies larger than `max_upload_bytes`.
    pub fn new(
        lifecycle: DocumentLifecycle,
        storage: Arc<dyn FileStorage>,
        queue: Arc<dyn ProcessingQueue>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            lifecycle,
            storage,
            queue,
            max_upload_bytes,
        }
    }

    fn validate(&self, upload: &DocumentUpload) -> Result<DocumentFilename, Error> {
        let declared = upload
            .content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        // Extension and declared type are checked independently.
        if DocumentFormat::from_content_type(declared).is_none() {
            return Err(Error::invalid_request("Only PDF and DOCX files are allowed"));
        }
        let filename = DocumentFilename::new(&upload.filename)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if upload.bytes.is_empty() {
            return Err(Error::invalid_request("uploaded file is empty"));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(Error::invalid_request(format!(
                "uploaded file exceeds {} bytes",
                self.max_upload_bytes
            )));
        }
        Ok(filename)
    }
}

#[async_trait]
impl DocumentWorkflow for DocumentServiceImpl {
    async fn upload(&self, owner: &AccountId, upload: DocumentUpload) -> Result<Document, Error> {
        let filename = self.validate(&upload)?;
        let location = self
            .storage
            .save(&filename, upload.bytes)
            .await
            .map_err(|err| {
                error!(error = %err, owner_id = %owner, "storing upload failed");
                Error::internal(err.to_string())
            })?;
        match self.lifecycle.create(owner, filename, location.clone()).await {
            Ok(document) => Ok(document),
            Err(err) => {
                // No record points at the file, so it must not outlive the error.
                if let Err(cleanup) = self.storage.remove(&location).await {
                    warn!(%location, error = %cleanup, "removing orphaned upload failed");
                }
                Err(err)
            }
        }
    }

    async fn list(&self, owner: &AccountId) -> Result<Vec<Document>, Error> {
        self.lifecycle.list_for(owner).await
    }

    async fn trigger_processing(
        &self,
        owner: &AccountId,
        id: DocumentId,
    ) -> Result<Document, Error> {
        let document = match self.lifecycle.begin_processing(id, Some(owner)).await? {
            BeginProcessing::Unchanged(document) => return Ok(document),
            BeginProcessing::Started(document) => document,
        };
        if let Err(err) = self.queue.submit(ProcessingJob::from(&document)) {
            warn!(document_id = %id, error = %err, "processing submission rejected");
            // Leave the document re-triggerable instead of stuck in PROCESSING.
            self.lifecycle.fail(id).await?;
            return Err(Error::service_unavailable(format!(
                "document processing unavailable: {err}"
            )));
        }
        Ok(document)
    }

    async fn status(&self, owner: &AccountId, id: DocumentId) -> Result<Document, Error> {
        self.lifecycle.get(id, owner).await
    }

    async fn result(&self, owner: &AccountId, id: DocumentId) -> Result<ProcessingResult, Error> {
        let document = self.lifecycle.get(id, owner).await?;
        match (document.status(), document.result()) {
            (DocumentStatus::Completed, Some(result)) => Ok(result.clone()),
            (status, _) => Err(Error::invalid_request(format!(
                "document not ready, current status: {status}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "document_service_tests.rs"]
mod tests;
