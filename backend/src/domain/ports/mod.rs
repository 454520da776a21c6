//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod document_repository;
mod document_workflow;
mod file_storage;
mod identity_service;
mod processing_queue;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError};
#[cfg(test)]
pub use document_repository::MockDocumentRepository;
pub use document_repository::{
    DocumentLookup, DocumentRepository, DocumentRepositoryError, StatusTransition,
};
#[cfg(test)]
pub use document_workflow::MockDocumentWorkflow;
pub use document_workflow::DocumentWorkflow;
#[cfg(test)]
pub use file_storage::MockFileStorage;
pub use file_storage::{FileStorage, FileStorageError};
#[cfg(test)]
pub use identity_service::MockIdentityService;
pub use identity_service::IdentityService;
#[cfg(test)]
pub use processing_queue::MockProcessingQueue;
pub use processing_queue::ProcessingQueue;
