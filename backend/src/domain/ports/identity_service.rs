//! Driving port for signup, login, and token refresh use-cases.
//!
//! Inbound adapters call it to authenticate callers without knowing the
//! backing persistence or hashing, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{
    Account, AccountId, Error, IssuedToken, LoginCredentials, SignupCredentials, TokenPair,
};

/// Domain use-case port for account identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Register a new account and issue its first token pair.
    async fn signup(&self, credentials: &SignupCredentials) -> Result<TokenPair, Error>;

    /// Verify credentials and issue a token pair.
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenPair, Error>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, Error>;

    /// Load the account behind an authenticated identity.
    async fn current_account(&self, id: &AccountId) -> Result<Account, Error>;
}
