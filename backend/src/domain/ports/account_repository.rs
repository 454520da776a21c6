//! Port abstraction for account persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Email};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// An account with this email already exists; nothing was written.
        DuplicateEmail { email: String } => "account already exists for {email}",
    }
}

/// Port for creating and looking up accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. Fails with
    /// [`AccountRepositoryError::DuplicateEmail`] when the email is taken.
    async fn create(&self, account: &Account) -> Result<(), AccountRepositoryError>;

    /// Exact, case-sensitive email lookup.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountRepositoryError>;
}
