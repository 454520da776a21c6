//! In-process repositories used when no database is configured.
//!
//! Each adapter keeps its records behind one `std::sync::Mutex`. Every port
//! method takes the lock once, does its work synchronously, and releases it
//! before returning, so no guard is ever held across an `.await`. A poisoned
//! lock is reported as a query error rather than a panic.

mod account_store;
mod document_store;

pub use account_store::InMemoryAccountRepository;
pub use document_store::InMemoryDocumentRepository;

fn poisoned(store: &str) -> String {
    format!("{store} store lock poisoned")
}
