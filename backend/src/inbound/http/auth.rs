//! Bearer-token authentication for HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! token parsing and identity derivation here. Every failure produces the
//! same `401` so clients learn nothing about why a token was refused.

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::{AccountId, Error, TokenKind};

use super::state::HttpState;

const INVALID_CREDENTIALS: &str = "could not validate credentials";

/// Identity proven by a valid access token.
///
/// Add it as a handler argument to require `Authorization: Bearer <token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount(AccountId);

impl AuthenticatedAccount {
    /// Identifier carried in the token subject.
    pub fn id(&self) -> &AccountId {
        &self.0
    }
}

/// Extract the token from an `Authorization: Bearer` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedAccount, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state not configured"))?;
    let Some(token) = bearer_token(req) else {
        debug!("request without bearer token");
        return Err(Error::unauthorized(INVALID_CREDENTIALS));
    };
    let subject = state
        .tokens
        .validate_kind(token, TokenKind::Access)
        .map_err(|_| Error::unauthorized(INVALID_CREDENTIALS))?;
    AccountId::new(&subject)
        .map(AuthenticatedAccount)
        .map_err(|err| {
            debug!(error = %err, "token subject is not an account id");
            Error::unauthorized(INVALID_CREDENTIALS)
        })
}

impl FromRequest for AuthenticatedAccount {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
