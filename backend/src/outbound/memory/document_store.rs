//! In-memory document repository with compare-and-swap transitions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{
    DocumentLookup, DocumentRepository, DocumentRepositoryError, StatusTransition,
};
use crate::domain::{AccountId, Document, DocumentId};

use super::poisoned;

/// Documents keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentRepository {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_documents<T>(
        &self,
        f: impl FnOnce(&mut HashMap<DocumentId, Document>) -> Result<T, DocumentRepositoryError>,
    ) -> Result<T, DocumentRepositoryError> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| DocumentRepositoryError::query(poisoned("document")))?;
        f(&mut documents)
    }
}

fn visible(document: &Document, lookup: &DocumentLookup) -> bool {
    lookup
        .owner
        .as_ref()
        .is_none_or(|owner| document.is_owned_by(owner))
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
        self.with_documents(|documents| {
            if documents.contains_key(&document.id()) {
                return Err(DocumentRepositoryError::query(format!(
                    "document {} already exists",
                    document.id()
                )));
            }
            documents.insert(document.id(), document.clone());
            Ok(())
        })
    }

    async fn find(
        &self,
        lookup: &DocumentLookup,
    ) -> Result<Option<Document>, DocumentRepositoryError> {
        self.with_documents(|documents| {
            Ok(documents
                .get(&lookup.id)
                .filter(|document| visible(document, lookup))
                .cloned())
        })
    }

    async fn list_for_owner(
        &self,
        owner: &AccountId,
    ) -> Result<Vec<Document>, DocumentRepositoryError> {
        self.with_documents(|documents| {
            let mut owned: Vec<Document> = documents
                .values()
                .filter(|document| document.is_owned_by(owner))
                .cloned()
                .collect();
            owned.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
            });
            Ok(owned)
        })
    }

    async fn transition(
        &self,
        transition: &StatusTransition,
    ) -> Result<Option<Document>, DocumentRepositoryError> {
        self.with_documents(|documents| {
            let Some(current) = documents.get_mut(&transition.lookup.id) else {
                return Ok(None);
            };
            if !visible(current, &transition.lookup) || !transition.from.contains(&current.status())
            {
                return Ok(None);
            }
            let updated = current
                .with_status(transition.to, transition.result.clone(), transition.at)
                .map_err(|err| DocumentRepositoryError::query(err.to_string()))?;
            *current = updated.clone();
            Ok(Some(updated))
        })
    }
}
