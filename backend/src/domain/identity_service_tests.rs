//! Tests for signup, login, and refresh orchestration.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockAccountRepository;
use crate::domain::{ErrorCode, HashingCost, SigningKey, TokenConfig, TokenKind};
use crate::outbound::memory::InMemoryAccountRepository;
use crate::test_support::MutableClock;

struct Harness {
    clock: Arc<MutableClock>,
    accounts: Arc<InMemoryAccountRepository>,
    tokens: Arc<TokenService>,
    service: IdentityServiceImpl<InMemoryAccountRepository>,
}

fn credential_store() -> Arc<CredentialStore> {
    Arc::new(CredentialStore::new(HashingCost::minimal()).expect("minimal cost is valid"))
}

fn token_service(clock: Arc<MutableClock>) -> Arc<TokenService> {
    let key = SigningKey::new(b"identity-test-secret".to_vec()).expect("non-empty key");
    Arc::new(TokenService::new(&key, TokenConfig::default(), clock).expect("service builds"))
}

#[fixture]
fn harness() -> Harness {
    let clock = Arc::new(MutableClock::at_epoch_offset());
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let tokens = token_service(clock.clone());
    let service = IdentityServiceImpl::new(
        accounts.clone(),
        credential_store(),
        tokens.clone(),
        clock.clone(),
    );
    Harness {
        clock,
        accounts,
        tokens,
        service,
    }
}

fn signup(email: &str, password: &str) -> SignupCredentials {
    SignupCredentials::try_from_parts(email, password).expect("valid signup")
}

fn login(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts(email, password).expect("valid login")
}

#[rstest]
#[tokio::test]
async fn signup_creates_account_and_issues_pair(harness: Harness) {
    let pair = harness
        .service
        .signup(&signup("a@x.com", "password123"))
        .await
        .expect("signup succeeds");

    assert_eq!(pair.access.kind, TokenKind::Access);
    assert_eq!(pair.refresh.kind, TokenKind::Refresh);
    let subject = harness
        .tokens
        .validate_kind(&pair.access.value, TokenKind::Access)
        .expect("access token valid");
    let account_id = AccountId::new(&subject).expect("subject is an account id");
    let stored = harness
        .accounts
        .find_by_id(&account_id)
        .await
        .expect("lookup")
        .expect("account stored");
    assert_eq!(stored.email().as_ref(), "a@x.com");
    assert_eq!(stored.created_at(), harness.clock.utc());
    assert_ne!(stored.password_hash().as_str(), "password123");
}

#[rstest]
#[tokio::test]
async fn duplicate_signup_is_a_conflict(harness: Harness) {
    let first = harness
        .service
        .signup(&signup("a@x.com", "password123"))
        .await
        .expect("first signup");
    let err = harness
        .service
        .signup(&signup("a@x.com", "another-password"))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "email already registered");

    // The original account still logs in with its own password.
    let pair = harness
        .service
        .login(&login("a@x.com", "password123"))
        .await
        .expect("original credentials still work");
    assert_eq!(
        harness.tokens.validate(&pair.access.value),
        harness.tokens.validate(&first.access.value)
    );
}

#[rstest]
#[tokio::test]
async fn login_returns_tokens_for_matching_password(harness: Harness) {
    harness
        .service
        .signup(&signup("b@x.com", "password123"))
        .await
        .expect("signup");
    let pair = harness
        .service
        .login(&login("b@x.com", "password123"))
        .await
        .expect("login");
    assert!(
        harness
            .tokens
            .validate_kind(&pair.refresh.value, TokenKind::Refresh)
            .is_ok()
    );
}

#[rstest]
#[case("b@x.com", "wrong-password")]
#[case("nobody@x.com", "password123")]
#[case("B@x.com", "password123")]
#[tokio::test]
async fn login_failures_are_indistinguishable(
    harness: Harness,
    #[case] email: &str,
    #[case] password: &str,
) {
    harness
        .service
        .signup(&signup("b@x.com", "password123"))
        .await
        .expect("signup");
    let err = harness
        .service
        .login(&login(email, password))
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "invalid email or password");
}

#[rstest]
#[tokio::test]
async fn unknown_email_never_matches_the_decoy_password(harness: Harness) {
    let err = harness
        .service
        .login(&login("ghost@x.com", crate::domain::credentials::DECOY_PASSWORD))
        .await
        .expect_err("rejected");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "invalid email or password");
}

#[rstest]
#[tokio::test]
async fn refresh_mints_access_token_for_same_subject(harness: Harness) {
    let pair = harness
        .service
        .signup(&signup("c@x.com", "password123"))
        .await
        .expect("signup");
    harness.clock.advance_seconds(60);

    let access = harness
        .service
        .refresh(&pair.refresh.value)
        .await
        .expect("refresh");
    assert_eq!(access.kind, TokenKind::Access);
    assert_eq!(
        harness.tokens.validate(&access.value),
        harness.tokens.validate(&pair.access.value)
    );
}

#[rstest]
#[tokio::test]
async fn refresh_rejects_access_tokens_and_garbage(harness: Harness) {
    let pair = harness
        .service
        .signup(&signup("d@x.com", "password123"))
        .await
        .expect("signup");
    for token in [pair.access.value.as_str(), "not-a-token", ""] {
        let err = harness
            .service
            .refresh(token)
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "invalid refresh token");
    }
}

#[rstest]
#[tokio::test]
async fn current_account_requires_existing_account(harness: Harness) {
    let err = harness
        .service
        .current_account(&AccountId::random())
        .await
        .expect_err("missing account");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn current_account_returns_signed_up_account(harness: Harness) {
    let pair = harness
        .service
        .signup(&signup("e@x.com", "password123"))
        .await
        .expect("signup");
    let subject = harness.tokens.validate(&pair.access.value).expect("valid");
    let account = harness
        .service
        .current_account(&AccountId::new(&subject).expect("account id"))
        .await
        .expect("account");
    assert_eq!(account.email().as_ref(), "e@x.com");
}

#[rstest]
#[tokio::test]
async fn racing_signup_maps_unique_violation_to_conflict() {
    let clock = Arc::new(MutableClock::at_epoch_offset());
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_email().times(1).return_once(|_| Ok(None));
    repo.expect_create()
        .times(1)
        .return_once(|_| Err(AccountRepositoryError::duplicate_email("a@x.com")));
    let service = IdentityServiceImpl::new(
        Arc::new(repo),
        credential_store(),
        token_service(clock.clone()),
        clock,
    );

    let err = service
        .signup(&signup("a@x.com", "password123"))
        .await
        .expect_err("lost the race");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn repository_outage_is_service_unavailable() {
    let clock = Arc::new(MutableClock::at_epoch_offset());
    let mut repo = MockAccountRepository::new();
    repo.expect_find_by_email()
        .times(1)
        .return_once(|_| Err(AccountRepositoryError::connection("refused")));
    let service = IdentityServiceImpl::new(
        Arc::new(repo),
        credential_store(),
        token_service(clock.clone()),
        clock,
    );

    let err = service
        .login(&login("a@x.com", "password123"))
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
