//! Account data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credentials::PasswordHash;

/// Validation errors returned by account constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    /// Identifier was blank.
    EmptyId,
    /// Identifier is not a UUID.
    InvalidId,
    /// Email was blank.
    EmptyEmail,
    /// Email is not a plausible address.
    InvalidEmail,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "account id must not be empty"),
            Self::InvalidId => write!(f, "account id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Stable account identifier stored as a UUID.
///
/// The string form doubles as the token subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(Uuid, String);

impl AccountId {
    /// Validate and construct an [`AccountId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`AccountId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, AccountValidationError> {
        if id.is_empty() {
            return Err(AccountValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(AccountValidationError::InvalidId);
        }
        let parsed = Uuid::parse_str(&id).map_err(|_| AccountValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        let AccountId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Email address used as the login identifier.
///
/// ## Invariants
/// - Surrounding whitespace is trimmed.
/// - Exactly one `@`, a non-empty local part, and a domain containing a dot
///   that neither starts nor ends the domain.
/// - Comparison is case-sensitive; no further normalisation is applied.
///
/// # Examples
/// ```
/// use backend::domain::Email;
///
/// let email = Email::new("  a@x.com ").unwrap();
/// assert_eq!(email.as_ref(), "a@x.com");
/// assert!(Email::new("not-an-email").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        let (local, domain) = trimmed
            .split_once('@')
            .ok_or(AccountValidationError::InvalidEmail)?;
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        let no_spaces = !trimmed.chars().any(char::is_whitespace);
        if local.is_empty() || !domain_ok || !no_spaces {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Registered account.
///
/// Accounts are created once at signup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    email: Email,
    password_hash: PasswordHash,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Build an account from validated parts.
    pub fn new(
        id: AccountId,
        email: Email,
        password_hash: PasswordHash,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password_hash,
            created_at,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// Login email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Stored password hash in PHC string form.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", AccountValidationError::EmptyId)]
    #[case("not-a-uuid", AccountValidationError::InvalidId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", AccountValidationError::InvalidId)]
    fn account_id_rejects_invalid_input(
        #[case] raw: &str,
        #[case] expected: AccountValidationError,
    ) {
        assert_eq!(AccountId::new(raw).expect_err("invalid id"), expected);
    }

    #[rstest]
    fn account_id_preserves_string_form() {
        let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let id = AccountId::new(raw).expect("valid id");
        assert_eq!(id.as_ref(), raw);
        assert_eq!(id.as_uuid().to_string(), raw);
    }

    #[rstest]
    #[case("a@x.com", "a@x.com")]
    #[case("  user.name@example.org\t", "user.name@example.org")]
    #[case("Mixed@Case.COM", "Mixed@Case.COM")]
    fn email_accepts_valid_addresses(#[case] raw: &str, #[case] expected: &str) {
        let email = Email::new(raw).expect("valid email");
        assert_eq!(email.as_ref(), expected);
    }

    #[rstest]
    #[case("   ", AccountValidationError::EmptyEmail)]
    #[case("nobody", AccountValidationError::InvalidEmail)]
    #[case("@x.com", AccountValidationError::InvalidEmail)]
    #[case("a@localhost", AccountValidationError::InvalidEmail)]
    #[case("a@x.com.", AccountValidationError::InvalidEmail)]
    #[case("a@@x.com", AccountValidationError::InvalidEmail)]
    #[case("a b@x.com", AccountValidationError::InvalidEmail)]
    fn email_rejects_invalid_addresses(
        #[case] raw: &str,
        #[case] expected: AccountValidationError,
    ) {
        assert_eq!(Email::new(raw).expect_err("invalid email"), expected);
    }

    #[rstest]
    fn email_comparison_is_case_sensitive() {
        let lower = Email::new("a@x.com").expect("valid");
        let upper = Email::new("A@x.com").expect("valid");
        assert_ne!(lower, upper);
    }
}
