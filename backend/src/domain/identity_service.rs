//! Account signup, login, and token refresh.
//!
//! Password hashing runs on the blocking pool because Argon2 is deliberately
//! slow. Every authentication failure for an operation carries one fixed
//! message so callers cannot tell a missing account from a wrong password.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{AccountRepository, AccountRepositoryError, IdentityService};
use crate::domain::{
    Account, AccountId, CredentialStore, Error, IssuedToken, LoginCredentials, PasswordHash,
    SignupCredentials, TokenPair, TokenService,
};

const INVALID_LOGIN: &str = "invalid email or password";
const INVALID_REFRESH: &str = "invalid refresh token";
const INVALID_IDENTITY: &str = "could not validate credentials";
const EMAIL_TAKEN: &str = "email already registered";

/// Identity service implementing the [`IdentityService`] driving port.
#[derive(Clone)]
pub struct IdentityServiceImpl<R> {
    accounts: Arc<R>,
    credentials: Arc<CredentialStore>,
    tokens: Arc<TokenService>,
    clock: Arc<dyn Clock>,
}

impl<R> IdentityServiceImpl<R> {
    /// Service over the given account store, hasher and token issuer.
    pub fn new(
        accounts: Arc<R>,
        credentials: Arc<CredentialStore>,
        tokens: Arc<TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            credentials,
            tokens,
            clock,
        }
    }

    fn issue_pair(&self, account: &Account) -> TokenPair {
        let subject = account.id().as_ref();
        TokenPair {
            access: self.tokens.issue_access(subject),
            refresh: self.tokens.issue_refresh(subject),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<PasswordHash, Error> {
        let store = Arc::clone(&self.credentials);
        let password = Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || store.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(|err| {
                error!(error = %err, "password hashing failed");
                Error::internal(err.to_string())
            })
    }

    async fn verify_password(&self, password: &str, hash: &PasswordHash) -> Result<bool, Error> {
        let store = Arc::clone(&self.credentials);
        let password = Zeroizing::new(password.to_owned());
        let hash = hash.clone();
        tokio::task::spawn_blocking(move || store.verify(&password, &hash))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
    }
}

fn map_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            warn!(%message, "account repository unavailable");
            Error::service_unavailable("account store unavailable")
        }
        AccountRepositoryError::Query { message } => {
            error!(%message, "account repository query failed");
            Error::internal(format!("account repository error: {message}"))
        }
        AccountRepositoryError::DuplicateEmail { .. } => Error::conflict(EMAIL_TAKEN),
    }
}

#[async_trait]
impl<R> IdentityService for IdentityServiceImpl<R>
where
    R: AccountRepository,
{
    async fn signup(&self, credentials: &SignupCredentials) -> Result<TokenPair, Error> {
        let email = credentials.email();
        if self
            .accounts
            .find_by_email(email)
            .await
            .map_err(map_repository_error)?
            .is_some()
        {
            debug!("signup rejected: email already registered");
            return Err(Error::conflict(EMAIL_TAKEN));
        }

        let hash = self.hash_password(credentials.password()).await?;
        let account = Account::new(AccountId::random(), email.clone(), hash, self.clock.utc());
        // The unique index still decides when two signups race.
        self.accounts
            .create(&account)
            .await
            .map_err(map_repository_error)?;
        info!(account_id = %account.id(), "account_created");
        Ok(self.issue_pair(&account))
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenPair, Error> {
        let Some(account) = self
            .accounts
            .find_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?
        else {
            // Pay the same Argon2 cost as a real mismatch.
            let decoy = self.credentials.decoy_hash().clone();
            self.verify_password(credentials.password(), &decoy).await?;
            debug!("login rejected: unknown email");
            return Err(Error::unauthorized(INVALID_LOGIN));
        };

        if !self
            .verify_password(credentials.password(), account.password_hash())
            .await?
        {
            debug!(account_id = %account.id(), "login rejected: password mismatch");
            return Err(Error::unauthorized(INVALID_LOGIN));
        }
        info!(account_id = %account.id(), "account_logged_in");
        Ok(self.issue_pair(&account))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, Error> {
        self.tokens
            .refresh(refresh_token)
            .map_err(|_| Error::unauthorized(INVALID_REFRESH))
    }

    async fn current_account(&self, id: &AccountId) -> Result<Account, Error> {
        self.accounts
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| {
                debug!(account_id = %id, "token subject has no account");
                Error::unauthorized(INVALID_IDENTITY)
            })
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
