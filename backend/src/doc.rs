//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, and the
//! request and response bodies they use. Authenticated routes declare the
//! `BearerAuth` scheme; signup, login, refresh, and the probes opt out.
//!
//! The generated document is served by Swagger UI in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{DocumentId, DocumentStatus, Error, ErrorCode};
use crate::inbound::http::accounts::{
    AccessTokenResponse, AccountResponse, CredentialsRequest, RefreshRequest, TokenPairResponse,
};
use crate::inbound::http::documents::{
    DocumentResponse, DocumentResultResponse, DocumentStatusResponse,
};
use crate::inbound::http::health::Banner;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token from POST /api/v1/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Docket API",
        description = "Document upload, asynchronous processing, and token authentication."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::refresh,
        crate::inbound::http::accounts::current_account,
        crate::inbound::http::documents::upload_document,
        crate::inbound::http::documents::list_documents,
        crate::inbound::http::documents::process_document,
        crate::inbound::http::documents::document_status,
        crate::inbound::http::documents::document_result,
        crate::inbound::http::health::banner,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        CredentialsRequest,
        RefreshRequest,
        TokenPairResponse,
        AccessTokenResponse,
        AccountResponse,
        DocumentResponse,
        DocumentStatusResponse,
        DocumentResultResponse,
        DocumentId,
        DocumentStatus,
        Banner,
        Error,
        ErrorCode
    )),
    tags(
        (name = "auth", description = "Signup, login, and token refresh"),
        (name = "documents", description = "Upload and processing of documents"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
