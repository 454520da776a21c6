//! Authentication primitives such as signup and login credentials.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::account::Email;
use super::tokens::IssuedToken;

/// Minimum password length, counted in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or not a valid address.
    InvalidEmail,
    /// Password was shorter than [`PASSWORD_MIN_CHARS`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

fn parse_parts(
    email: &str,
    password: &str,
) -> Result<(Email, Zeroizing<String>), CredentialsValidationError> {
    let email = Email::new(email).map_err(|_| CredentialsValidationError::InvalidEmail)?;
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(CredentialsValidationError::PasswordTooShort {
            min: PASSWORD_MIN_CHARS,
        });
    }
    Ok((email, Zeroizing::new(password.to_owned())))
}

/// Validated signup request.
///
/// ## Invariants
/// - `email` satisfies [`Email`] validation.
/// - `password` has at least [`PASSWORD_MIN_CHARS`] characters and retains
///   caller-provided whitespace.
///
/// # Examples
/// ```
/// use backend::domain::SignupCredentials;
///
/// let creds = SignupCredentials::try_from_parts("a@x.com", "password123").unwrap();
/// assert_eq!(creds.email().as_ref(), "a@x.com");
/// assert!(SignupCredentials::try_from_parts("a@x.com", "short").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl SignupCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let (email, password) = parse_parts(email, password)?;
        Ok(Self { email, password })
    }

    /// Email to register.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plaintext password to hash.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated login request. Same rules as [`SignupCredentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let (email, password) = parse_parts(email, password)?;
        Ok(Self { email, password })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Access and refresh tokens returned by signup and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access: IssuedToken,
    /// Refresh token for minting new access tokens.
    pub refresh: IssuedToken,
}
