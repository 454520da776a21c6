//! PostgreSQL-backed `DocumentRepository` implementation using Diesel ORM.
//!
//! Status transitions are one conditional statement:
//!
//! ```text
//! UPDATE documents SET status = $to, result = $result, updated_at = $at
//! WHERE id = $id [AND owner_id = $owner] AND status IN ($from...)
//! RETURNING *
//! ```
//!
//! so concurrent triggers race inside PostgreSQL and exactly one wins.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    DocumentLookup, DocumentRepository, DocumentRepositoryError, StatusTransition,
};
use crate::domain::{
    AccountId, Document, DocumentFilename, DocumentId, DocumentParts, ProcessingResult,
    StoredFileLocation,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DocumentRow, DocumentStatusUpdate, NewDocumentRow};
use super::pool::{DbPool, PoolError};
use super::schema::documents;

/// Diesel-backed implementation of the `DocumentRepository` port.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: DbPool,
}

impl DieselDocumentRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DocumentRepositoryError {
    map_basic_pool_error(error, DocumentRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DocumentRepositoryError {
    map_basic_diesel_error(
        error,
        DocumentRepositoryError::query,
        DocumentRepositoryError::connection,
    )
}

fn corrupt(id: uuid::Uuid, err: impl std::fmt::Display) -> DocumentRepositoryError {
    DocumentRepositoryError::query(format!("stored document {id} is invalid: {err}"))
}

fn row_to_document(row: DocumentRow) -> Result<Document, DocumentRepositoryError> {
    let DocumentRow {
        id,
        owner_id,
        filename,
        file_path,
        status,
        result,
        created_at,
        updated_at,
    } = row;
    let parts = DocumentParts {
        id: DocumentId::from_uuid(id),
        owner: AccountId::from_uuid(owner_id),
        filename: DocumentFilename::new(filename).map_err(|err| corrupt(id, err))?,
        location: StoredFileLocation::new(file_path).map_err(|err| corrupt(id, err))?,
        status: status.parse().map_err(|err| corrupt(id, err))?,
        result: result
            .map(ProcessingResult::new)
            .transpose()
            .map_err(|err| corrupt(id, err))?,
        created_at,
        updated_at,
    };
    Document::from_parts(parts).map_err(|err| corrupt(id, err))
}

#[async_trait]
impl DocumentRepository for DieselDocumentRepository {
    async fn insert(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewDocumentRow {
            id: *document.id().as_uuid(),
            owner_id: *document.owner().as_uuid(),
            filename: document.filename().as_ref(),
            file_path: document.location().as_ref(),
            status: document.status().as_str(),
            result: document.result().map(AsRef::as_ref),
            created_at: document.created_at(),
            updated_at: document.updated_at(),
        };

        diesel::insert_into(documents::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        lookup: &DocumentLookup,
    ) -> Result<Option<Document>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = documents::table
            .filter(documents::id.eq(lookup.id.as_uuid()))
            .select(DocumentRow::as_select())
            .into_boxed();
        if let Some(owner) = &lookup.owner {
            query = query.filter(documents::owner_id.eq(owner.as_uuid()));
        }

        let row: Option<DocumentRow> = query
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_document).transpose()
    }

    async fn list_for_owner(
        &self,
        owner: &AccountId,
    ) -> Result<Vec<Document>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DocumentRow> = documents::table
            .filter(documents::owner_id.eq(owner.as_uuid()))
            .order((documents::created_at.desc(), documents::id.desc()))
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_document).collect()
    }

    async fn transition(
        &self,
        transition: &StatusTransition,
    ) -> Result<Option<Document>, DocumentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let from: Vec<&'static str> = transition.from.iter().map(|s| s.as_str()).collect();
        let changes = DocumentStatusUpdate {
            status: transition.to.as_str(),
            result: transition.result.as_ref().map(AsRef::as_ref),
            updated_at: transition.at,
        };
        let target = documents::table
            .filter(documents::id.eq(*transition.lookup.id.as_uuid()))
            .filter(documents::status.eq_any(from));

        let row: Option<DocumentRow> = match &transition.lookup.owner {
            Some(owner) => {
                diesel::update(target.filter(documents::owner_id.eq(*owner.as_uuid())))
                    .set(&changes)
                    .returning(DocumentRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
            None => {
                diesel::update(target)
                    .set(&changes)
                    .returning(DocumentRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
        }
        .optional()
        .map_err(map_diesel_error)?;

        row.map(row_to_document).transpose()
    }
}
