//! End-to-end document flow through the public HTTP surface.
//!
//! Signup, upload, processing, and result retrieval run against the real
//! services, the in-memory repositories, filesystem storage in a temporary
//! directory, and the simulated processor driven by a live scheduler.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
use actix_web::{App, test, web};
use mockable::{Clock, DefaultClock};
use serde_json::{Value, json};
use tempfile::TempDir;

use backend::Trace;
use backend::domain::ports::FileStorage;
use backend::domain::{
    CredentialStore, DocumentLifecycle, DocumentServiceImpl, HashingCost, IdentityServiceImpl,
    ProcessingScheduler, SchedulerConfig, SigningKey, SimulatedProcessor, SimulationConfig,
    TokenConfig, TokenService,
};
use backend::inbound::http::configure_api;
use backend::inbound::http::state::HttpState;
use backend::outbound::memory::{InMemoryAccountRepository, InMemoryDocumentRepository};
use backend::outbound::storage::LocalFileStorage;

const UPLOAD_LIMIT: usize = 64 * 1024;

struct Stack {
    state: web::Data<HttpState>,
    scheduler: Arc<ProcessingScheduler>,
    uploads: TempDir,
}

fn build_stack(failure_rate: f64) -> Stack {
    let uploads = TempDir::new().expect("temp dir");
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let key = SigningKey::new(b"integration-secret".to_vec()).expect("key");
    let tokens = Arc::new(
        TokenService::new(&key, TokenConfig::default(), Arc::clone(&clock)).expect("tokens"),
    );
    let credentials = Arc::new(CredentialStore::new(HashingCost::minimal()).expect("cost"));
    let identity = IdentityServiceImpl::new(
        Arc::new(InMemoryAccountRepository::new()),
        credentials,
        Arc::clone(&tokens),
        Arc::clone(&clock),
    );
    let storage: Arc<dyn FileStorage> =
        Arc::new(LocalFileStorage::open(uploads.path()).expect("storage"));
    let lifecycle = DocumentLifecycle::new(Arc::new(InMemoryDocumentRepository::new()), clock);
    let simulation =
        SimulationConfig::new(Duration::ZERO, Duration::from_millis(5), failure_rate)
            .expect("simulation config");
    let scheduler = Arc::new(ProcessingScheduler::start(
        lifecycle.clone(),
        Arc::new(SimulatedProcessor::new(Arc::clone(&storage), simulation)),
        SchedulerConfig::new(2, 8).expect("scheduler config"),
    ));
    let documents =
        DocumentServiceImpl::new(lifecycle, storage, scheduler.clone(), UPLOAD_LIMIT);
    let state = web::Data::new(HttpState::new(
        Arc::new(identity),
        Arc::new(documents),
        tokens,
        UPLOAD_LIMIT,
    ));
    Stack {
        state,
        scheduler,
        uploads,
    }
}

async fn json_body(response: ServiceResponse) -> Value {
    test::read_body_json(response).await
}

async fn signup<S>(app: &S, email: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .set_json(json!({ "email": email, "password": "password123" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["accessToken"]
        .as_str()
        .expect("access token")
        .to_owned()
}

fn authorised(request: test::TestRequest, token: &str) -> test::TestRequest {
    request.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

async fn wait_for_terminal_status<S>(app: &S, token: &str, id: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    for _ in 0..200 {
        let response = test::call_service(
            app,
            authorised(
                test::TestRequest::get().uri(&format!("/api/v1/documents/{id}/status")),
                token,
            )
            .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let status = json_body(response).await["status"]
            .as_str()
            .expect("status")
            .to_owned();
        if status == "COMPLETED" || status == "FAILED" {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("document {id} never reached a terminal status");
}

#[actix_rt::test]
async fn uploaded_document_is_processed_once_and_result_is_readable() {
    let stack = build_stack(0.0);
    let app = test::init_service(
        App::new()
            .app_data(stack.state.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;
    let token = signup(&app, "flow@example.com").await;

    let upload = test::call_service(
        &app,
        authorised(
            test::TestRequest::post()
                .uri("/api/v1/documents?filename=report.pdf")
                .insert_header((CONTENT_TYPE, "application/pdf"))
                .set_payload("%PDF-1.7 fake"),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(upload.status(), StatusCode::CREATED);
    let document = json_body(upload).await;
    let id = document["id"].as_str().expect("id").to_owned();
    assert_eq!(document["status"], "UPLOADED");
    assert_eq!(document["filename"], "report.pdf");
    let stored = std::fs::read_dir(stack.uploads.path())
        .expect("upload dir")
        .count();
    assert_eq!(stored, 1);

    let early = test::call_service(
        &app,
        authorised(
            test::TestRequest::get().uri(&format!("/api/v1/documents/{id}/result")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(early.status(), StatusCode::BAD_REQUEST);

    let process = test::call_service(
        &app,
        authorised(
            test::TestRequest::post().uri(&format!("/api/v1/documents/{id}/process")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(process.status(), StatusCode::ACCEPTED);

    assert_eq!(
        wait_for_terminal_status(&app, &token, &id).await,
        "COMPLETED"
    );

    let result = test::call_service(
        &app,
        authorised(
            test::TestRequest::get().uri(&format!("/api/v1/documents/{id}/result")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(result.status(), StatusCode::OK);
    let body = json_body(result).await;
    let text = body["result"].as_str().expect("result text");
    assert!(text.contains("report.pdf"), "unexpected result: {text}");

    let again = test::call_service(
        &app,
        authorised(
            test::TestRequest::post().uri(&format!("/api/v1/documents/{id}/process")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(again.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(again).await["status"], "COMPLETED");

    stack.scheduler.shutdown().await;
}

#[actix_rt::test]
async fn failing_processor_leaves_document_failed_and_retryable() {
    let stack = build_stack(1.0);
    let app = test::init_service(
        App::new()
            .app_data(stack.state.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;
    let token = signup(&app, "fails@example.com").await;

    let upload = test::call_service(
        &app,
        authorised(
            test::TestRequest::post()
                .uri("/api/v1/documents?filename=notes.docx")
                .insert_header((
                    CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                ))
                .set_payload("PK fake docx"),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(upload.status(), StatusCode::CREATED);
    let id = json_body(upload).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let process_uri = format!("/api/v1/documents/{id}/process");
    let first = test::call_service(
        &app,
        authorised(test::TestRequest::post().uri(&process_uri), &token).to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    assert_eq!(wait_for_terminal_status(&app, &token, &id).await, "FAILED");

    let result = test::call_service(
        &app,
        authorised(
            test::TestRequest::get().uri(&format!("/api/v1/documents/{id}/result")),
            &token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(result.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(result).await["message"],
        "document not ready, current status: FAILED"
    );

    let retry = test::call_service(
        &app,
        authorised(test::TestRequest::post().uri(&process_uri), &token).to_request(),
    )
    .await;
    assert_eq!(retry.status(), StatusCode::ACCEPTED);
    assert_eq!(wait_for_terminal_status(&app, &token, &id).await, "FAILED");

    stack.scheduler.shutdown().await;
}

#[actix_rt::test]
async fn documents_are_invisible_to_other_accounts() {
    let stack = build_stack(0.0);
    let app = test::init_service(
        App::new()
            .app_data(stack.state.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;
    let owner = signup(&app, "owner@example.com").await;
    let stranger = signup(&app, "stranger@example.com").await;

    let upload = test::call_service(
        &app,
        authorised(
            test::TestRequest::post()
                .uri("/api/v1/documents?filename=private.pdf")
                .insert_header((CONTENT_TYPE, "application/pdf"))
                .set_payload("%PDF"),
            &owner,
        )
        .to_request(),
    )
    .await;
    let id = json_body(upload).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let foreign = test::call_service(
        &app,
        authorised(
            test::TestRequest::get().uri(&format!("/api/v1/documents/{id}/status")),
            &stranger,
        )
        .to_request(),
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let listing = test::call_service(
        &app,
        authorised(test::TestRequest::get().uri("/api/v1/documents"), &stranger).to_request(),
    )
    .await;
    assert_eq!(listing.status(), StatusCode::OK);
    assert_eq!(json_body(listing).await, json!([]));

    stack.scheduler.shutdown().await;
}
