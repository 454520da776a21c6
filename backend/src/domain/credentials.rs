//! Salted password hashing and verification.
//!
//! Hashes are Argon2id PHC strings, so the salt and cost parameters travel
//! with the digest and verification never needs external state. Digest
//! comparison inside `password-hash` is constant time.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl HashingCost {
    /// Smallest cost Argon2 accepts. Only suitable for tests.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashingCost {
    /// OWASP-recommended Argon2id baseline.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Errors raised by [`CredentialStore`].
///
/// A wrong password is not an error; see [`CredentialStore::verify`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The configured cost parameters are outside Argon2's accepted range.
    #[error("invalid hashing cost: {message}")]
    InvalidCost { message: String },
    /// The hasher itself failed.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

/// Opaque PHC-formatted password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a stored hash string without validating it.
    ///
    /// Malformed values simply never verify.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// PHC string suitable for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Password hasher and verifier.
///
/// # Examples
/// ```
/// use backend::domain::{CredentialStore, HashingCost};
///
/// let store = CredentialStore::new(HashingCost::minimal()).unwrap();
/// let hash = store.hash("password123").unwrap();
/// assert!(store.verify("password123", &hash));
/// assert!(!store.verify("password124", &hash));
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    hasher: Argon2<'static>,
    cost: HashingCost,
    decoy: PasswordHash,
}

pub(crate) const DECOY_PASSWORD: &str = "docket-decoy-password";

impl CredentialStore {
    /// Build a store using Argon2id with the given cost.
    ///
    /// # Errors
    /// Returns [`CredentialError::InvalidCost`] for parameters Argon2 rejects.
    pub fn new(cost: HashingCost) -> Result<Self, CredentialError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|err| CredentialError::InvalidCost {
                message: err.to_string(),
            })?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy = hash_with(&hasher, DECOY_PASSWORD)?;
        Ok(Self {
            hasher,
            cost,
            decoy,
        })
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns [`CredentialError::Hashing`] if Argon2 fails.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, CredentialError> {
        hash_with(&self.hasher, password)
    }

    /// Fixed hash at this store's cost, verified in place of a missing
    /// account's hash so both login failures take equally long.
    pub fn decoy_hash(&self) -> &PasswordHash {
        &self.decoy
    }

    /// Returns `true` only when `password` produced `hash`.
    ///
    /// Malformed or foreign hashes verify as `false`.
    pub fn verify(&self, password: &str, hash: &PasswordHash) -> bool {
        let Ok(parsed) = PhcHash::new(hash.as_str()) else {
            return false;
        };
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

fn hash_with(hasher: &Argon2<'_>, password: &str) -> Result<PasswordHash, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CredentialError::Hashing {
            message: err.to_string(),
        })?;
    Ok(PasswordHash(hash.to_string()))
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> CredentialStore {
        CredentialStore::new(HashingCost::minimal()).expect("minimal cost is valid")
    }

    #[rstest]
    #[case("password123")]
    #[case("correct horse battery staple")]
    #[case("ünïcödé-pässwörd")]
    fn hash_then_verify_succeeds(store: CredentialStore, #[case] password: &str) {
        let hash = store.hash(password).expect("hashing succeeds");
        assert!(store.verify(password, &hash));
    }

    #[rstest]
    #[case("password123", "password124")]
    #[case("password123", "Password123")]
    #[case("password123", "password123 ")]
    fn verify_rejects_other_passwords(
        store: CredentialStore,
        #[case] original: &str,
        #[case] attempt: &str,
    ) {
        let hash = store.hash(original).expect("hashing succeeds");
        assert!(!store.verify(attempt, &hash));
    }

    #[rstest]
    fn hashes_are_salted(store: CredentialStore) {
        let first = store.hash("password123").expect("hash");
        let second = store.hash("password123").expect("hash");
        assert_ne!(first, second);
        assert!(store.verify("password123", &first));
        assert!(store.verify("password123", &second));
    }

    #[rstest]
    #[case("")]
    #[case("plaintext")]
    #[case("$argon2id$v=19$m=8,t=1,p=1$garbage")]
    fn malformed_hashes_never_verify(store: CredentialStore, #[case] raw: &str) {
        assert!(!store.verify("password123", &PasswordHash::from_stored(raw)));
    }

    #[rstest]
    fn hashes_use_argon2id_phc_format(store: CredentialStore) {
        let hash = store.hash("password123").expect("hash");
        assert!(hash.as_str().starts_with("$argon2id$"));
    }

    #[rstest]
    fn rejects_out_of_range_cost() {
        let cost = HashingCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        let err = CredentialStore::new(cost).expect_err("cost below minimum");
        assert!(matches!(err, CredentialError::InvalidCost { .. }));
    }

    #[rstest]
    fn decoy_hash_shares_the_store_cost(store: CredentialStore) {
        let real = store.hash("password123").expect("hash");
        let params = |hash: &PasswordHash| {
            PhcHash::new(hash.as_str())
                .expect("phc string")
                .params
                .to_string()
        };

        assert_eq!(params(store.decoy_hash()), params(&real));
        assert!(!store.verify("password123", store.decoy_hash()));
    }

    #[rstest]
    fn debug_output_hides_hash() {
        let hash = PasswordHash::from_stored("$argon2id$secret");
        assert_eq!(format!("{hash:?}"), "PasswordHash(..)");
    }
}
