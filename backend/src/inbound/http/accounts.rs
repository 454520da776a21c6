//! Account and token API handlers.
//!
//! ```text
//! POST /api/v1/auth/signup {"email":"a@x.com","password":"password123"}
//! POST /api/v1/auth/login {"email":"a@x.com","password":"password123"}
//! POST /api/v1/auth/refresh {"refreshToken":"..."}
//! GET /api/v1/auth/me
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Account, CredentialsValidationError, Error, IssuedToken, LoginCredentials, SignupCredentials,
    TokenPair,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedAccount;
use crate::inbound::http::state::HttpState;

const TOKEN_TYPE: &str = "bearer";

/// Email and password body shared by signup and login.
///
/// Example JSON:
/// `{"email":"a@x.com","password":"password123"}`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    /// Account email address.
    pub email: String,
    /// Plain-text password, at least 8 characters.
    pub password: String,
}

/// Body for `POST /api/v1/auth/refresh`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token from signup or login.
    pub refresh_token: String,
}

/// Access and refresh token pair.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token for `POST /api/v1/auth/refresh`.
    pub refresh_token: String,
    /// Always `bearer`.
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access.value,
            refresh_token: pair.refresh.value,
            token_type: TOKEN_TYPE.to_owned(),
        }
    }
}

/// Freshly minted access token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Always `bearer`.
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl From<IssuedToken> for AccessTokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.value,
            token_type: TOKEN_TYPE.to_owned(),
        }
    }
}

/// Identity behind the presented access token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account identifier.
    #[schema(format = "uuid")]
    pub id: String,
    /// Account email address.
    pub email: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id().to_string(),
            email: account.email().to_string(),
        }
    }
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    let (field, code) = match err {
        CredentialsValidationError::InvalidEmail => ("email", "invalid_email"),
        CredentialsValidationError::PasswordTooShort { .. } => ("password", "password_too_short"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Register an account and return its first token pair.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Account created", body = TokenPairResponse),
        (status = 400, description = "Invalid request or email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/auth/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<TokenPairResponse>> {
    let CredentialsRequest { email, password } = payload.into_inner();
    let credentials =
        SignupCredentials::try_from_parts(&email, &password).map_err(map_credentials_error)?;
    let pair = state.identity.signup(&credentials).await?;
    Ok(web::Json(pair.into()))
}

/// Exchange email and password for a token pair.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login success", body = TokenPairResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<TokenPairResponse>> {
    let CredentialsRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_credentials_error)?;
    let pair = state.identity.login(&credentials).await?;
    Ok(web::Json(pair.into()))
}

/// Mint a new access token from a refresh token.
///
/// The refresh token is not rotated and stays usable until it expires.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = Error)
    ),
    tags = ["auth"],
    operation_id = "refreshToken",
    security([])
)]
#[post("/auth/refresh")]
pub async fn refresh(
    state: web::Data<HttpState>,
    payload: web::Json<RefreshRequest>,
) -> ApiResult<web::Json<AccessTokenResponse>> {
    let token = state
        .identity
        .refresh(&payload.into_inner().refresh_token)
        .await?;
    Ok(web::Json(token.into()))
}

/// Return the account behind the bearer token.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Invalid or expired token", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentAccount"
)]
#[get("/auth/me")]
pub async fn current_account(
    state: web::Data<HttpState>,
    caller: AuthenticatedAccount,
) -> ApiResult<web::Json<AccountResponse>> {
    let account = state.identity.current_account(caller.id()).await?;
    Ok(web::Json(account.into()))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
