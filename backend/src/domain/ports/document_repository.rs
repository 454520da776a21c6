//! Port for document persistence, including the atomic status transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccountId, Document, DocumentId, DocumentStatus, ProcessingResult};

use super::define_port_error;

define_port_error! {
    /// Errors raised by document repository adapters.
    pub enum DocumentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "document repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "document repository query failed: {message}",
    }
}

/// Which document to read and whose view to read it through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLookup {
    /// Document to look up.
    pub id: DocumentId,
    /// `None` skips the ownership filter (background callers only).
    pub owner: Option<AccountId>,
}

impl DocumentLookup {
    /// Lookup scoped to `owner`.
    pub fn owned_by(id: DocumentId, owner: AccountId) -> Self {
        Self {
            id,
            owner: Some(owner),
        }
    }

    /// Lookup without ownership filtering.
    pub fn unscoped(id: DocumentId) -> Self {
        Self { id, owner: None }
    }
}

/// Conditional status update.
///
/// Adapters must apply it as one atomic compare-and-swap: set `to`/`result`
/// only if the stored status is one of `from` (and the owner matches when
/// given), returning the updated document, or `None` when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// Document and ownership filter.
    pub lookup: DocumentLookup,
    /// Statuses the swap may start from.
    pub from: Vec<DocumentStatus>,
    /// Status to store.
    pub to: DocumentStatus,
    /// Result to store alongside `to`.
    pub result: Option<ProcessingResult>,
    /// New `updated_at` timestamp.
    pub at: DateTime<Utc>,
}

/// Port for reading and mutating documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Persist a new document.
    async fn insert(&self, document: &Document) -> Result<(), DocumentRepositoryError>;

    /// Find a document, honouring the lookup's ownership filter.
    async fn find(&self, lookup: &DocumentLookup)
    -> Result<Option<Document>, DocumentRepositoryError>;

    /// All documents owned by `owner`, newest-created first.
    async fn list_for_owner(
        &self,
        owner: &AccountId,
    ) -> Result<Vec<Document>, DocumentRepositoryError>;

    /// Apply a conditional status update atomically.
    async fn transition(
        &self,
        transition: &StatusTransition,
    ) -> Result<Option<Document>, DocumentRepositoryError>;
}
