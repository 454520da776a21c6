//! Document API handlers.
//!
//! ```text
//! POST /api/v1/documents?filename=report.pdf   (raw body, Content-Type: application/pdf)
//! GET /api/v1/documents
//! POST /api/v1/documents/{id}/process
//! GET /api/v1/documents/{id}/status
//! GET /api/v1/documents/{id}/result
//! ```
//!
//! Every route requires a bearer access token and only ever sees documents
//! owned by the caller; other owners' documents are reported as not found.

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Document, DocumentId, DocumentStatus, DocumentUpload, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedAccount;
use crate::inbound::http::state::HttpState;

/// Query parameters for `POST /api/v1/documents`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Original filename; must end in `.pdf` or `.docx`.
    pub filename: Option<String>,
}

/// Document metadata returned by upload and list.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    /// Document identifier.
    pub id: DocumentId,
    /// Original filename.
    pub filename: String,
    /// Current status.
    pub status: DocumentStatus,
    /// Upload time.
    pub created_at: DateTime<Utc>,
    /// Time of the last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentResponse {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id(),
            filename: document.filename().to_string(),
            status: document.status(),
            created_at: document.created_at(),
            updated_at: document.updated_at(),
        }
    }
}

/// Current processing status of a document.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatusResponse {
    /// Document identifier.
    pub document_id: DocumentId,
    /// Current status.
    pub status: DocumentStatus,
}

impl From<&Document> for DocumentStatusResponse {
    fn from(document: &Document) -> Self {
        Self {
            document_id: document.id(),
            status: document.status(),
        }
    }
}

/// Processing output of a completed document.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResultResponse {
    /// Document identifier.
    pub document_id: DocumentId,
    /// Extracted text.
    pub result: String,
}

fn parse_document_id(raw: &str) -> Result<DocumentId, Error> {
    raw.parse().map_err(|_| {
        Error::invalid_request("document id must be a valid UUID")
            .with_details(json!({ "field": "id", "code": "invalid_document_id" }))
    })
}

async fn read_body(mut payload: web::Payload, limit: usize) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|err| Error::invalid_request(format!("failed to read upload: {err}")))?;
        if bytes.len() + chunk.len() > limit {
            return Err(Error::invalid_request(format!(
                "uploaded file exceeds {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Upload a PDF or DOCX file.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/pdf", description = "Raw file bytes"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Invalid file type, name, or size", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["documents"],
    operation_id = "uploadDocument"
)]
#[post("/documents")]
pub async fn upload_document(
    state: web::Data<HttpState>,
    caller: AuthenticatedAccount,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let filename = query
        .into_inner()
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            Error::invalid_request("filename query parameter is required")
                .with_details(json!({ "field": "filename", "code": "missing_filename" }))
        })?;
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = read_body(payload, state.max_upload_bytes).await?;

    let document = state
        .documents
        .upload(
            caller.id(),
            DocumentUpload {
                filename,
                content_type,
                bytes,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(DocumentResponse::from(&document)))
}

/// List the caller's documents, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    responses(
        (status = 200, description = "Owned documents", body = [DocumentResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["documents"],
    operation_id = "listDocuments"
)]
#[get("/documents")]
pub async fn list_documents(
    state: web::Data<HttpState>,
    caller: AuthenticatedAccount,
) -> ApiResult<web::Json<Vec<DocumentResponse>>> {
    let documents = state.documents.list(caller.id()).await?;
    Ok(web::Json(
        documents.iter().map(DocumentResponse::from).collect(),
    ))
}

/// Start processing, or report the current status if already started.
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/process",
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 202, description = "Processing started or already underway", body = DocumentStatusResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Document not found", body = Error),
        (status = 503, description = "Processing queue unavailable", body = Error)
    ),
    tags = ["documents"],
    operation_id = "processDocument"
)]
#[post("/documents/{id}/process")]
pub async fn process_document(
    state: web::Data<HttpState>,
    caller: AuthenticatedAccount,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_document_id(&path)?;
    let document = state.documents.trigger_processing(caller.id(), id).await?;
    Ok(HttpResponse::Accepted().json(DocumentStatusResponse::from(&document)))
}

/// Report a document's processing status.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/status",
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "Current status", body = DocumentStatusResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Document not found", body = Error)
    ),
    tags = ["documents"],
    operation_id = "documentStatus"
)]
#[get("/documents/{id}/status")]
pub async fn document_status(
    state: web::Data<HttpState>,
    caller: AuthenticatedAccount,
    path: web::Path<String>,
) -> ApiResult<web::Json<DocumentStatusResponse>> {
    let id = parse_document_id(&path)?;
    let document = state.documents.status(caller.id(), id).await?;
    Ok(web::Json(DocumentStatusResponse::from(&document)))
}

/// Return the processing result of a completed document.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/result",
    params(("id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "Processing result", body = DocumentResultResponse),
        (status = 400, description = "Document not completed", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Document not found", body = Error)
    ),
    tags = ["documents"],
    operation_id = "documentResult"
)]
#[get("/documents/{id}/result")]
pub async fn document_result(
    state: web::Data<HttpState>,
    caller: AuthenticatedAccount,
    path: web::Path<String>,
) -> ApiResult<web::Json<DocumentResultResponse>> {
    let id = parse_document_id(&path)?;
    let result = state.documents.result(caller.id(), id).await?;
    Ok(web::Json(DocumentResultResponse {
        document_id: id,
        result: result.into(),
    }))
}

#[cfg(test)]
#[path = "documents_tests.rs"]
mod tests;
