//! Test helpers for inbound HTTP components.
//!
//! [`TestHarness`] wires the real domain services over in-memory adapters so
//! handler tests exercise the same code paths as production, minus I/O.

use std::sync::{Arc, Mutex};

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use rstest::fixture;

use crate::Trace;
use crate::domain::ports::{FileStorage, MockFileStorage, ProcessingQueue};
use crate::domain::{
    CredentialStore, DocumentLifecycle, DocumentServiceImpl, HashingCost, IdentityServiceImpl,
    ProcessingJob, ProcessingScheduler, ProcessingStrategy, SchedulerConfig, SigningKey,
    StoredFileLocation, SubmitError, TokenConfig, TokenService,
};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{InMemoryAccountRepository, InMemoryDocumentRepository};
use crate::test_support::MutableClock;

/// Upload limit used by handler tests.
pub const TEST_UPLOAD_LIMIT: usize = 1024;

/// Queue that accepts every job and remembers it.
#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<ProcessingJob>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<ProcessingJob> {
        self.jobs.lock().expect("queue mutex").clone()
    }
}

impl ProcessingQueue for RecordingQueue {
    fn submit(&self, job: ProcessingJob) -> Result<(), SubmitError> {
        self.jobs.lock().expect("queue mutex").push(job);
        Ok(())
    }
}

fn accepting_storage() -> MockFileStorage {
    let mut storage = MockFileStorage::new();
    storage.expect_save().returning(|filename, _| {
        Ok(StoredFileLocation::new(format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            filename.format().extension()
        ))
        .expect("non-empty location"))
    });
    storage.expect_exists().returning(|_| Ok(true));
    storage
}

/// Domain services over in-memory adapters.
pub struct TestHarness {
    pub clock: Arc<MutableClock>,
    pub tokens: Arc<TokenService>,
    pub lifecycle: DocumentLifecycle,
    pub queue: Arc<RecordingQueue>,
    pub state: HttpState,
}

impl TestHarness {
    /// Harness whose documents are processed by a real scheduler running
    /// `strategy`. Must be called inside a Tokio runtime.
    pub fn with_scheduler(
        strategy: Arc<dyn ProcessingStrategy>,
    ) -> (Self, Arc<ProcessingScheduler>) {
        let mut scheduler = None;
        let harness = Self::build(|lifecycle| {
            let started = Arc::new(ProcessingScheduler::start(
                lifecycle.clone(),
                strategy,
                SchedulerConfig::default(),
            ));
            scheduler = Some(started.clone());
            started
        });
        let scheduler = scheduler.expect("scheduler built with harness");
        (harness, scheduler)
    }

    fn build(make_queue: impl FnOnce(&DocumentLifecycle) -> Arc<dyn ProcessingQueue>) -> Self {
        let clock = Arc::new(MutableClock::at_epoch_offset());
        let key = SigningKey::new(b"http-test-secret".to_vec()).expect("non-empty key");
        let tokens = Arc::new(
            TokenService::new(&key, TokenConfig::default(), clock.clone())
                .expect("token service builds"),
        );
        let credentials =
            Arc::new(CredentialStore::new(HashingCost::minimal()).expect("minimal cost"));
        let identity = IdentityServiceImpl::new(
            Arc::new(InMemoryAccountRepository::new()),
            credentials,
            tokens.clone(),
            clock.clone(),
        );
        let lifecycle = DocumentLifecycle::new(
            Arc::new(InMemoryDocumentRepository::new()),
            clock.clone(),
        );
        let recording = Arc::new(RecordingQueue::default());
        let queue = make_queue(&lifecycle);
        let storage: Arc<dyn FileStorage> = Arc::new(accepting_storage());
        let documents =
            DocumentServiceImpl::new(lifecycle.clone(), storage, queue, TEST_UPLOAD_LIMIT);
        let state = HttpState::new(
            Arc::new(identity),
            Arc::new(documents),
            tokens.clone(),
            TEST_UPLOAD_LIMIT,
        );
        Self {
            clock,
            tokens,
            lifecycle,
            queue: recording,
            state,
        }
    }

    /// Harness whose queue records submissions without running them.
    pub fn recording() -> Self {
        let recording = Arc::new(RecordingQueue::default());
        let mut harness = Self::build(|_| recording.clone());
        harness.queue = recording;
        harness
    }

    /// Shared state for a fresh app instance.
    pub fn data(&self) -> web::Data<HttpState> {
        web::Data::new(self.state.clone())
    }

    /// App with every API route mounted under `/api/v1`.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.data())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api))
    }
}

/// Harness whose queue records submissions without running them.
#[fixture]
pub fn harness() -> TestHarness {
    TestHarness::recording()
}
