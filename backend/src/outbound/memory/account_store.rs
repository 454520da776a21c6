//! In-memory account repository.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, AccountId, Email};

use super::poisoned;

/// Accounts keyed by id, with email uniqueness checked on insert.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<AccountId, Account>>,
}

impl InMemoryAccountRepository {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_accounts<T>(
        &self,
        f: impl FnOnce(&mut HashMap<AccountId, Account>) -> Result<T, AccountRepositoryError>,
    ) -> Result<T, AccountRepositoryError> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| AccountRepositoryError::query(poisoned("account")))?;
        f(&mut accounts)
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        self.with_accounts(|accounts| {
            if accounts
                .values()
                .any(|existing| existing.email() == account.email())
            {
                return Err(AccountRepositoryError::duplicate_email(
                    account.email().as_ref(),
                ));
            }
            accounts.insert(account.id().clone(), account.clone());
            Ok(())
        })
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountRepositoryError> {
        self.with_accounts(|accounts| {
            Ok(accounts
                .values()
                .find(|account| account.email() == email)
                .cloned())
        })
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        self.with_accounts(|accounts| Ok(accounts.get(id).cloned()))
    }
}
