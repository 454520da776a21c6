//! Builders wiring adapters into the HTTP state and the processing scheduler.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use backend::domain::ports::{
    AccountRepository, DocumentRepository, FileStorage, IdentityService, ProcessingQueue,
};
use backend::domain::{
    CredentialStore, DocumentLifecycle, DocumentServiceImpl, HashingCost, IdentityServiceImpl,
    ProcessingScheduler, SimulatedProcessor, TokenService,
};
use backend::inbound::http::state::HttpState;
use backend::outbound::memory::{InMemoryAccountRepository, InMemoryDocumentRepository};
use backend::outbound::persistence::{DieselAccountRepository, DieselDocumentRepository};
use backend::outbound::storage::LocalFileStorage;
use tracing::info;

use super::ServerConfig;

/// Long-lived components shared by every worker.
pub(super) struct AppComponents {
    pub(super) http_state: web::Data<HttpState>,
    pub(super) scheduler: Arc<ProcessingScheduler>,
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

fn identity_service<R>(
    accounts: R,
    credentials: Arc<CredentialStore>,
    tokens: Arc<TokenService>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn IdentityService>
where
    R: AccountRepository + 'static,
{
    Arc::new(IdentityServiceImpl::new(
        Arc::new(accounts),
        credentials,
        tokens,
        clock,
    ))
}

/// Build repositories, services, and the scheduler from `config`.
///
/// Diesel adapters back accounts and documents when a pool is configured;
/// otherwise both live in memory for the life of the process. Must be called
/// from within a Tokio runtime because the scheduler spawns its dispatcher.
///
/// # Errors
/// Returns [`std::io::Error`] when the upload directory cannot be opened or
/// the credential or token settings are rejected.
pub(super) fn build_components(config: &ServerConfig) -> std::io::Result<AppComponents> {
    let settings = &config.settings;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let tokens = Arc::new(
        TokenService::new(&settings.signing_key, settings.tokens, Arc::clone(&clock))
            .map_err(|err| startup_error("token service", err))?,
    );
    let credentials = Arc::new(
        CredentialStore::new(HashingCost::default())
            .map_err(|err| startup_error("credential store", err))?,
    );
    let storage: Arc<dyn FileStorage> = Arc::new(
        LocalFileStorage::open(settings.upload_dir.clone())
            .map_err(|err| startup_error("upload directory", err))?,
    );

    let (identity, documents): (Arc<dyn IdentityService>, Arc<dyn DocumentRepository>) =
        match &config.db_pool {
            Some(pool) => {
                info!("using PostgreSQL repositories");
                (
                    identity_service(
                        DieselAccountRepository::new(pool.clone()),
                        credentials,
                        Arc::clone(&tokens),
                        Arc::clone(&clock),
                    ),
                    Arc::new(DieselDocumentRepository::new(pool.clone())),
                )
            }
            None => {
                info!("no database configured; using in-memory repositories");
                (
                    identity_service(
                        InMemoryAccountRepository::new(),
                        credentials,
                        Arc::clone(&tokens),
                        Arc::clone(&clock),
                    ),
                    Arc::new(InMemoryDocumentRepository::new()),
                )
            }
        };

    let lifecycle = DocumentLifecycle::new(documents, clock);
    let strategy = Arc::new(SimulatedProcessor::new(
        Arc::clone(&storage),
        settings.simulation,
    ));
    let scheduler = Arc::new(ProcessingScheduler::start(
        lifecycle.clone(),
        strategy,
        settings.scheduler,
    ));
    let queue: Arc<dyn ProcessingQueue> = scheduler.clone();
    let workflow = Arc::new(DocumentServiceImpl::new(
        lifecycle,
        storage,
        queue,
        settings.max_upload_bytes,
    ));

    let http_state = web::Data::new(HttpState::new(
        identity,
        workflow,
        tokens,
        settings.max_upload_bytes,
    ));

    Ok(AppComponents {
        http_state,
        scheduler,
    })
}
