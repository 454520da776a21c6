//! Signed access and refresh tokens.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).
//! base64url(signature)`. Validation is stateless; a token stops being valid
//! only when its expiry passes. Every rejection surfaces as the single
//! [`TokenError::InvalidToken`] so callers cannot probe which check failed.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

const SIGNING_ALGORITHM: &str = "HS256";

/// Purpose a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential for identity-scoped operations.
    Access,
    /// Longer-lived credential used only to mint access tokens.
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic token validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token is malformed, forged, expired, or of the wrong kind.
    #[error("invalid token")]
    InvalidToken,
}

/// Errors raised while building a [`TokenService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenSetupError {
    /// The signing secret was empty.
    #[error("token signing secret must not be empty")]
    EmptySecret,
    /// A TTL was zero or negative.
    #[error("{kind} token lifetime must be positive")]
    NonPositiveTtl { kind: TokenKind },
    /// The MAC rejected the key.
    #[error("signing key rejected: {message}")]
    InvalidKey { message: String },
}

/// Process-wide HMAC secret.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    /// Wrap a non-empty secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenSetupError> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(TokenSetupError::EmptySecret);
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl TokenConfig {
    /// Validate and build lifetimes for both token kinds.
    pub fn new(access_ttl: TimeDelta, refresh_ttl: TimeDelta) -> Result<Self, TokenSetupError> {
        if access_ttl <= TimeDelta::zero() {
            return Err(TokenSetupError::NonPositiveTtl {
                kind: TokenKind::Access,
            });
        }
        if refresh_ttl <= TimeDelta::zero() {
            return Err(TokenSetupError::NonPositiveTtl {
                kind: TokenKind::Refresh,
            });
        }
        Ok(Self {
            access_ttl,
            refresh_ttl,
        })
    }

    /// Lifetime for tokens of `kind`.
    pub fn ttl(&self, kind: TokenKind) -> TimeDelta {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl: TimeDelta::minutes(30),
            refresh_ttl: TimeDelta::days(7),
        }
    }
}

/// Decoded claims of a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account identifier).
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Token kind.
    pub kind: TokenKind,
}

/// Freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact serialised token.
    pub value: String,
    /// Kind the token was minted as.
    pub kind: TokenKind,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Internal reason a token failed validation. Logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Malformed,
    Algorithm,
    Signature,
    Expired,
    EmptySubject,
    WrongKind,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Malformed => "malformed",
            Self::Algorithm => "unexpected algorithm",
            Self::Signature => "signature mismatch",
            Self::Expired => "expired",
            Self::EmptySubject => "empty subject",
            Self::WrongKind => "wrong token kind",
        };
        f.write_str(reason)
    }
}

/// Issues and validates signed tokens.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use backend::domain::{SigningKey, TokenConfig, TokenService};
/// use mockable::DefaultClock;
///
/// let key = SigningKey::new(b"secret".to_vec()).unwrap();
/// let tokens = TokenService::new(&key, TokenConfig::default(), Arc::new(DefaultClock)).unwrap();
/// let issued = tokens.issue_access("account-1");
/// assert_eq!(tokens.validate(&issued.value).unwrap(), "account-1");
/// ```
#[derive(Clone)]
pub struct TokenService {
    mac: HmacSha256,
    config: TokenConfig,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Key the MAC once; every signature clones the keyed state.
    pub fn new(
        key: &SigningKey,
        config: TokenConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenSetupError> {
        let mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|err| {
            TokenSetupError::InvalidKey {
                message: err.to_string(),
            }
        })?;
        Ok(Self { mac, config, clock })
    }

    /// Mint an access token for `subject`.
    pub fn issue_access(&self, subject: &str) -> IssuedToken {
        self.issue(subject, TokenKind::Access)
    }

    /// Mint a refresh token for `subject`.
    pub fn issue_refresh(&self, subject: &str) -> IssuedToken {
        self.issue(subject, TokenKind::Refresh)
    }

    fn issue(&self, subject: &str, kind: TokenKind) -> IssuedToken {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.config.ttl(kind);
        let header = json!({ "alg": SIGNING_ALGORITHM, "typ": "JWT" }).to_string();
        let claims = json!({
            "sub": subject,
            "iat": issued_at.timestamp(),
            "exp": expires_at.timestamp(),
            "kind": kind.as_str(),
        })
        .to_string();
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        IssuedToken {
            value: format!("{signing_input}.{signature}"),
            kind,
            expires_at,
        }
    }

    /// Validate a token of any kind and return its subject.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        self.validate_claims(token).map(|claims| claims.sub)
    }

    /// Validate a token and require it to be of `kind`.
    pub fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<String, TokenError> {
        let claims = self.validate_claims(token)?;
        if claims.kind != kind {
            return Err(reject(Rejection::WrongKind));
        }
        Ok(claims.sub)
    }

    /// Validate a token and return every claim.
    pub fn validate_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode(token).map_err(reject)
    }

    /// Exchange a valid refresh token for a new access token.
    ///
    /// The refresh token itself stays valid until it expires.
    pub fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, TokenError> {
        let subject = self.validate_kind(refresh_token, TokenKind::Refresh)?;
        Ok(self.issue_access(&subject))
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, Rejection> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(Rejection::Malformed)?;
        let mut segments = signing_input.split('.');
        let (Some(header), Some(claims), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(Rejection::Malformed);
        };

        let header: Header = decode_json(header)?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(Rejection::Algorithm);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Rejection::Malformed)?;
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Rejection::Signature)?;

        let claims: TokenClaims = decode_json(claims)?;
        if self.clock.utc().timestamp() > claims.exp {
            return Err(Rejection::Expired);
        }
        if claims.sub.trim().is_empty() {
            return Err(Rejection::EmptySubject);
        }
        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn reject(reason: Rejection) -> TokenError {
    debug!(%reason, "token rejected");
    TokenError::InvalidToken
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, Rejection> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Rejection::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| Rejection::Malformed)
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
