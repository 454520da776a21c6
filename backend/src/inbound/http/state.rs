//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::TokenService;
use crate::domain::ports::{DocumentWorkflow, IdentityService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Signup, login and account lookup.
    pub identity: Arc<dyn IdentityService>,
    /// Owner-scoped document operations.
    pub documents: Arc<dyn DocumentWorkflow>,
    /// Validates bearer tokens on identity-scoped routes.
    pub tokens: Arc<TokenService>,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl HttpState {
    /// Construct state from the driving ports and the token validator.
    ///
    /// # Examples
    /// ```ignore
    /// let state = HttpState::new(identity, documents, tokens, 20 * 1024 * 1024);
    /// ```
    pub fn new(
        identity: Arc<dyn IdentityService>,
        documents: Arc<dyn DocumentWorkflow>,
        tokens: Arc<TokenService>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            identity,
            documents,
            tokens,
            max_upload_bytes,
        }
    }
}
