//! Document status state machine.
//!
//! `UPLOADED -> PROCESSING -> {COMPLETED, FAILED}`, with `FAILED` allowed to
//! re-enter `PROCESSING` on a new trigger. Every transition is a single
//! conditional update through [`DocumentRepository::transition`], so two
//! concurrent triggers cannot both observe a startable status and both win.

use std::sync::Arc;

use mockable::Clock;
use tracing::{error, info, warn};

use crate::domain::ports::{
    DocumentLookup, DocumentRepository, DocumentRepositoryError, StatusTransition,
};
use crate::domain::{
    AccountId, Document, DocumentFilename, DocumentId, DocumentStatus, Error, ProcessingResult,
    StoredFileLocation,
};

/// Attempts at the begin-processing compare-and-swap before giving up.
const BEGIN_PROCESSING_ATTEMPTS: usize = 3;

/// Outcome of a processing trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginProcessing {
    /// The document moved to `PROCESSING`; the caller must submit it.
    Started(Document),
    /// The document was already `PROCESSING` or `COMPLETED`.
    Unchanged(Document),
}

fn not_found() -> Error {
    Error::not_found("document not found")
}

fn map_repository_error(error: DocumentRepositoryError) -> Error {
    match error {
        DocumentRepositoryError::Connection { message } => {
            warn!(%message, "document repository unavailable");
            Error::service_unavailable("document store unavailable")
        }
        DocumentRepositoryError::Query { message } => {
            error!(%message, "document repository query failed");
            Error::internal(format!("document repository error: {message}"))
        }
    }
}

/// Owner of every document status change.
#[derive(Clone)]
pub struct DocumentLifecycle {
    documents: Arc<dyn DocumentRepository>,
    clock: Arc<dyn Clock>,
}

impl DocumentLifecycle {
    /// Lifecycle over `documents`, stamping changes with `clock`.
    pub fn new(documents: Arc<dyn DocumentRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { documents, clock }
    }

    /// Record a newly stored upload in `UPLOADED`.
    pub async fn create(
        &self,
        owner: &AccountId,
        filename: DocumentFilename,
        location: StoredFileLocation,
    ) -> Result<Document, Error> {
        let document = Document::uploaded(owner.clone(), filename, location, self.clock.utc());
        self.documents
            .insert(&document)
            .await
            .map_err(|err| match err {
                DocumentRepositoryError::Query { message } => {
                    error!(%message, owner_id = %owner, "document insert failed");
                    Error::conflict("document could not be recorded")
                }
                connection @ DocumentRepositoryError::Connection { .. } => {
                    map_repository_error(connection)
                }
            })?;
        info!(
            document_id = %document.id(),
            owner_id = %owner,
            filename = %document.filename(),
            "document_uploaded"
        );
        Ok(document)
    }

    /// Move a startable document to `PROCESSING`, durably, before any
    /// background work is scheduled.
    ///
    /// `requester` applies the ownership filter; background callers pass
    /// `None`. Already `PROCESSING` or `COMPLETED` documents come back
    /// unchanged.
    pub async fn begin_processing(
        &self,
        id: DocumentId,
        requester: Option<&AccountId>,
    ) -> Result<BeginProcessing, Error> {
        let lookup = DocumentLookup {
            id,
            owner: requester.cloned(),
        };
        for _ in 0..BEGIN_PROCESSING_ATTEMPTS {
            let transition = StatusTransition {
                lookup: lookup.clone(),
                from: DocumentStatus::STARTABLE.to_vec(),
                to: DocumentStatus::Processing,
                result: None,
                at: self.clock.utc(),
            };
            if let Some(document) = self
                .documents
                .transition(&transition)
                .await
                .map_err(map_repository_error)?
            {
                info!(document_id = %id, "document_processing_started");
                return Ok(BeginProcessing::Started(document));
            }

            match self
                .documents
                .find(&lookup)
                .await
                .map_err(map_repository_error)?
            {
                None => return Err(not_found()),
                Some(document) if !document.status().can_start_processing() => {
                    return Ok(BeginProcessing::Unchanged(document));
                }
                // Moved back to a startable status between the two calls.
                Some(_) => {}
            }
        }
        error!(document_id = %id, "document status kept changing during trigger");
        Err(Error::internal("document status changed concurrently"))
    }

    /// `PROCESSING -> COMPLETED` with `result`.
    ///
    /// Returns `Ok(None)` and logs when the document is not `PROCESSING`.
    pub async fn complete(
        &self,
        id: DocumentId,
        result: ProcessingResult,
    ) -> Result<Option<Document>, Error> {
        let updated = self
            .finish(id, DocumentStatus::Completed, Some(result))
            .await?;
        if updated.is_some() {
            info!(document_id = %id, "document_processing_completed");
        }
        Ok(updated)
    }

    /// `PROCESSING -> FAILED`, leaving the result empty.
    ///
    /// Returns `Ok(None)` and logs when the document is not `PROCESSING`.
    pub async fn fail(&self, id: DocumentId) -> Result<Option<Document>, Error> {
        let updated = self.finish(id, DocumentStatus::Failed, None).await?;
        if updated.is_some() {
            info!(document_id = %id, "document_processing_failed");
        }
        Ok(updated)
    }

    async fn finish(
        &self,
        id: DocumentId,
        to: DocumentStatus,
        result: Option<ProcessingResult>,
    ) -> Result<Option<Document>, Error> {
        let transition = StatusTransition {
            lookup: DocumentLookup::unscoped(id),
            from: vec![DocumentStatus::Processing],
            to,
            result,
            at: self.clock.utc(),
        };
        let updated = self
            .documents
            .transition(&transition)
            .await
            .map_err(map_repository_error)?;
        if updated.is_none() {
            warn!(
                document_id = %id,
                target = %to,
                "ignoring transition for document not in PROCESSING"
            );
        }
        Ok(updated)
    }

    /// Fetch a document visible to `requester`.
    pub async fn get(&self, id: DocumentId, requester: &AccountId) -> Result<Document, Error> {
        self.documents
            .find(&DocumentLookup::owned_by(id, requester.clone()))
            .await
            .map_err(map_repository_error)?
            .ok_or_else(not_found)
    }

    /// Documents owned by `owner`, newest-created first.
    pub async fn list_for(&self, owner: &AccountId) -> Result<Vec<Document>, Error> {
        let mut documents = self
            .documents
            .list_for_owner(owner)
            .await
            .map_err(map_repository_error)?;
        documents.sort_by_key(|document| std::cmp::Reverse(document.created_at()));
        Ok(documents)
    }
}

#[cfg(test)]
#[path = "document_lifecycle_tests.rs"]
mod tests;
