//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, plus the services that own authentication and the
//! document lifecycle. Adapters talk to this layer only through the types
//! re-exported here and the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - CredentialStore / TokenService: password hashing and signed tokens.
//! - DocumentLifecycle: the only writer of document status.
//! - ProcessingScheduler: bounded background execution of processing jobs.
//! - IdentityServiceImpl / DocumentServiceImpl: driving port implementations.

pub mod account;
pub mod auth;
pub mod credentials;
pub mod document;
pub mod document_lifecycle;
pub mod document_service;
pub mod error;
pub mod identity_service;
pub mod ports;
pub mod processing;
pub mod processing_scheduler;
pub mod tokens;
pub mod trace_id;

pub use self::account::{Account, AccountId, AccountValidationError, Email};
pub use self::auth::{
    CredentialsValidationError, LoginCredentials, PASSWORD_MIN_CHARS, SignupCredentials, TokenPair,
};
pub use self::credentials::{CredentialError, CredentialStore, HashingCost, PasswordHash};
pub use self::document::{
    Document, DocumentFilename, DocumentFormat, DocumentId, DocumentParts, DocumentStatus,
    DocumentValidationError, ProcessingResult, StoredFileLocation,
};
pub use self::document_lifecycle::{BeginProcessing, DocumentLifecycle};
pub use self::document_service::{DEFAULT_MAX_UPLOAD_BYTES, DocumentServiceImpl, DocumentUpload};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity_service::IdentityServiceImpl;
pub use self::processing::{
    FixedProcessor, ProcessingFailure, ProcessingJob, ProcessingSleeper, ProcessingStrategy,
    SimulatedProcessor, SimulationConfig, SimulationConfigError, TokioSleeper,
};
pub use self::processing_scheduler::{
    ProcessingScheduler, SchedulerConfig, SchedulerConfigError, SubmitError,
};
pub use self::tokens::{
    IssuedToken, SigningKey, TokenClaims, TokenConfig, TokenError, TokenKind, TokenService,
    TokenSetupError,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
