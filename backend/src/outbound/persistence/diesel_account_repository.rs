//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! Email uniqueness is enforced by the `accounts_email_unique` constraint;
//! a violating insert writes nothing and surfaces as
//! [`AccountRepositoryError::DuplicateEmail`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{Account, AccountId, Email, PasswordHash};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{AccountRow, NewAccountRow};
use super::pool::{DbPool, PoolError};
use super::schema::accounts;

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    map_basic_pool_error(error, AccountRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AccountRepositoryError {
    map_basic_diesel_error(
        error,
        AccountRepositoryError::query,
        AccountRepositoryError::connection,
    )
}

fn row_to_account(row: AccountRow) -> Result<Account, AccountRepositoryError> {
    let email = Email::new(&row.email).map_err(|err| {
        AccountRepositoryError::query(format!("stored email for {} is invalid: {err}", row.id))
    })?;
    Ok(Account::new(
        AccountId::from_uuid(row.id),
        email,
        PasswordHash::from_stored(row.password_hash),
        row.created_at,
    ))
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewAccountRow {
            id: *account.id().as_uuid(),
            email: account.email().as_ref(),
            password_hash: account.password_hash().as_str(),
            created_at: account.created_at(),
            updated_at: account.created_at(),
        };

        diesel::insert_into(accounts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AccountRepositoryError::duplicate_email(account.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .filter(accounts::email.eq(email.as_ref()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .find(id.as_uuid())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; queries run against PostgreSQL in deployment.
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use uuid::Uuid;

    fn row(email: &str) -> AccountRow {
        AccountRow {
            id: Uuid::nil(),
            email: email.to_owned(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_owned(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time"),
        }
    }

    #[rstest]
    fn converts_rows_into_accounts() {
        let account = row_to_account(row("a@x.com")).expect("valid row");

        assert_eq!(account.id().as_uuid(), &Uuid::nil());
        assert_eq!(account.email().as_ref(), "a@x.com");
        assert!(account.password_hash().as_str().starts_with("$argon2id$"));
    }

    #[rstest]
    fn corrupt_emails_become_query_errors() {
        let err = row_to_account(row("not-an-email")).expect_err("invalid row");

        assert!(matches!(err, AccountRepositoryError::Query { .. }));
    }
}
