//! Docket backend library.
//!
//! Accounts authenticate with Argon2id-hashed passwords and HS256 bearer
//! tokens. Authenticated owners upload PDF or DOCX files, request
//! background processing, and poll for status and results. The domain layer
//! owns every rule; HTTP, PostgreSQL, in-memory, and filesystem adapters
//! plug into its ports.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
