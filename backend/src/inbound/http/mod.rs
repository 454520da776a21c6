//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod accounts;
pub mod auth;
pub mod documents;
pub mod error;
pub mod health;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use backend::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| error::json_payload_error(&err).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| error::query_payload_error(&err).into()),
    )
    .service(accounts::signup)
        .service(accounts::login)
        .service(accounts::refresh)
        .service(accounts::current_account)
        .service(documents::upload_document)
        .service(documents::list_documents)
        .service(documents::process_document)
        .service(documents::document_status)
        .service(documents::document_result);
}
