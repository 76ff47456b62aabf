//! Contract tests for RemoteResourceService.
//!
//! These tests pin the behaviour the sync engine relies on, using the
//! in-memory fake. Any conforming implementation must behave the same way.

use outlyer_api::fakes::{MemoryRemoteService, RemoteMethod};
use outlyer_api::{ApiError, RemoteResourceService};

// ===========================================================================
// get
// ===========================================================================

#[tokio::test]
async fn get_returns_seeded_document() {
    let remote = MemoryRemoteService::new().with_document("/accounts/acme/alerts", "- name: docker\n");
    let body = remote.get("/accounts/acme/alerts").await.unwrap();

    assert_eq!(body, b"- name: docker\n");
}

#[tokio::test]
async fn get_ignores_query_when_only_plain_path_is_seeded() {
    let remote = MemoryRemoteService::new().with_document("/accounts/acme/alerts", "[]");
    let body = remote
        .get("/accounts/acme/alerts?view=export")
        .await
        .unwrap();

    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let remote = MemoryRemoteService::new();
    let err = remote.get("/accounts/acme/alerts/nope").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn get_injected_status_is_classified() {
    let remote = MemoryRemoteService::new().with_status(
        "/accounts/acme/checks",
        503,
        "detail: maintenance",
    );
    let err = remote.get("/accounts/acme/checks").await.unwrap_err();

    assert!(matches!(err, ApiError::Unavailable(ref d) if d == "maintenance"));
}

// ===========================================================================
// update / create
// ===========================================================================

#[tokio::test]
async fn update_unknown_path_answers_404() {
    let remote = MemoryRemoteService::new();
    let resp = remote
        .update("/accounts/acme/alerts/docker", b"name: docker\n")
        .await
        .unwrap();

    assert!(resp.is_not_found());
    assert!(remote.document("/accounts/acme/alerts/docker").is_none());
}

#[tokio::test]
async fn create_stores_document_under_its_name() {
    let remote = MemoryRemoteService::new();
    let resp = remote
        .create("/accounts/acme/alerts", b"name: docker\n")
        .await
        .unwrap();

    assert!(resp.is_success());
    assert_eq!(
        remote.document("/accounts/acme/alerts/docker").unwrap(),
        b"name: docker\n"
    );
}

#[tokio::test]
async fn update_after_create_succeeds() {
    let remote = MemoryRemoteService::new();
    remote
        .create("/accounts/acme/plugins", b"name: docker.py\nencoding: base64\ncontent: ''\n")
        .await
        .unwrap();
    let resp = remote
        .update("/accounts/acme/plugins/docker.py", b"name: docker.py\n")
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
}

#[tokio::test]
async fn create_without_name_is_bad_request() {
    let remote = MemoryRemoteService::new();
    let resp = remote
        .create("/accounts/acme/alerts", b"description: nameless\n")
        .await
        .unwrap();

    assert!(matches!(resp.error(), Some(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn transport_failure_is_an_error_not_a_status() {
    let remote = MemoryRemoteService::new()
        .with_transport_error("/accounts/acme/alerts/docker", "connection reset");
    let err = remote
        .update("/accounts/acme/alerts/docker", b"name: docker\n")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn calls_are_recorded() {
    let remote = MemoryRemoteService::new();
    let _ = remote.update("/accounts/acme/alerts/a", b"name: a\n").await;
    let _ = remote.create("/accounts/acme/alerts", b"name: a\n").await;
    let _ = remote.get("/accounts/acme/alerts/a").await;

    let calls = remote.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].method, RemoteMethod::Update);
    assert_eq!(calls[1].method, RemoteMethod::Create);
    assert_eq!(calls[2].method, RemoteMethod::Get);
    assert_eq!(
        remote.paths_for(RemoteMethod::Create),
        vec!["/accounts/acme/alerts".to_string()]
    );
}
