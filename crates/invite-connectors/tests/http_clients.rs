//! HTTP client tests
//!
//! Each test starts a local axum server that imitates the key-vault, registry
//! and identity services, then drives the real `reqwest` clients against it:
//! - request shape (paths, query filters, bearer tokens, JSON bodies)
//! - error mapping (404 → NotFound, service messages surfaced)
//! - retry only for transient GET failures, never for POST
//! - per-request timeouts

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use invite_connectors::{
    ApiClient, HttpIdentity, HttpKeyVault, HttpRegistry, IdentityService, KeyVaultService,
    RegistryService, RetryPolicy, ServiceError, SignOptions,
};
use invite_core::{BaselineParams, InvitationParams, InvitationPayload, KeySpec};

const ORG_TOKEN: &str = "org-token";
const APP_TOKEN: &str = "app-token";

// =============================================================================
// Fake services
// =============================================================================

#[derive(Default)]
struct FakeState {
    vault_failures_remaining: AtomicUsize,
    vault_list_attempts: AtomicUsize,
    sign_attempts: AtomicUsize,
    sign_requests: Mutex<Vec<Value>>,
    signed_keys: Mutex<Vec<String>>,
    invitations: Mutex<Vec<Value>>,
}

type Shared = Arc<FakeState>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized"}))).into_response()
}

async fn list_vaults(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.vault_list_attempts.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers).as_deref() != Some(ORG_TOKEN) {
        return unauthorized();
    }
    let remaining = state.vault_failures_remaining.load(Ordering::SeqCst);
    if remaining > 0 {
        state.vault_failures_remaining.store(remaining - 1, Ordering::SeqCst);
        return (StatusCode::SERVICE_UNAVAILABLE, "vault warming up").into_response();
    }
    match query.get("organization_id").map(String::as_str) {
        Some("org-1") => Json(json!([
            {"id": "vault-2", "created_at": "2024-03-01T00:00:00Z"},
            {"id": "vault-1", "created_at": "2024-01-01T00:00:00Z", "name": "primary"}
        ]))
        .into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn list_keys(
    Path(vault_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let spec = query.get("spec").cloned().unwrap_or_default();
    Json(json!([
        {"id": "key-1", "vault_id": vault_id, "spec": spec, "address": "0xABC"}
    ]))
}

async fn sign(
    State(state): State<Shared>,
    Path((_vault_id, key_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    state.sign_attempts.fetch_add(1, Ordering::SeqCst);
    state.sign_requests.lock().unwrap().push(body);
    state.signed_keys.lock().unwrap().push(key_id.clone());
    match key_id.as_str() {
        "down" => (StatusCode::SERVICE_UNAVAILABLE, "hsm offline").into_response(),
        "unsigned" => Json(json!({})).into_response(),
        _ => Json(json!({"signature": "deadbeef"})).into_response(),
    }
}

async fn slow_sign() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"signature": "00"}))
}

async fn list_contracts(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let matches = query.get("application_id").map(String::as_str) == Some("wg-1")
        && query.get("type").map(String::as_str) == Some("organization-registry");
    if matches {
        Json(json!([{"id": "c-1", "address": "0xDEF", "type": "organization-registry"}]))
    } else {
        Json(json!([]))
    }
}

async fn organization(Path(organization_id): Path<String>) -> Response {
    if organization_id == "org-1" {
        Json(json!({
            "id": "org-1",
            "name": "Org One",
            "metadata": {"messaging_endpoint": "nats://org-1:4222"}
        }))
        .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"message": "organization not found"}]})),
        )
            .into_response()
    }
}

async fn create_invitation(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers).as_deref() != Some(APP_TOKEN) {
        return unauthorized();
    }
    if body["email"] == "taken@b.com" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"errors": [{"message": "user already invited"}]})),
        )
            .into_response();
    }
    state.invitations.lock().unwrap().push(body);
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_fake(state: Shared) -> String {
    let app = Router::new()
        .route("/api/v1/vaults", get(list_vaults))
        .route("/api/v1/vaults/{vault_id}/keys", get(list_keys))
        .route("/api/v1/vaults/{vault_id}/keys/{key_id}/sign", post(sign))
        .route("/slow/api/v1/vaults/{vault_id}/keys/{key_id}/sign", post(slow_sign))
        .route("/api/v1/contracts", get(list_contracts))
        .route("/api/v1/organizations/{organization_id}", get(organization))
        .route("/api/v1/invitations", post(create_invitation))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, token: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5))
        .unwrap()
        .with_token(token)
}

fn payload(email: &str) -> InvitationPayload {
    InvitationPayload {
        application_id: "wg-1".into(),
        email: email.into(),
        params: InvitationParams {
            baseline: BaselineParams::new("0xABC", "0xDEF", "wg-1").with_bearer_token("a.b.c"),
            managed_tenant: true,
        },
    }
}

// =============================================================================
// Key vault
// =============================================================================

#[tokio::test]
async fn test_list_vaults_sends_bearer_and_filter() {
    let state = Shared::default();
    let base = spawn_fake(state.clone()).await;
    let vault = HttpKeyVault::new(client(&base, ORG_TOKEN));

    let vaults = vault.list_vaults("org-1").await.unwrap();
    assert_eq!(vaults.len(), 2);
    assert_eq!(vaults[1].name.as_deref(), Some("primary"));
    assert!(vaults[1].created_at.is_some());

    assert!(vault.list_vaults("org-2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let base = spawn_fake(Shared::default()).await;
    let vault = HttpKeyVault::new(client(&base, "stolen"));

    let err = vault.list_vaults("org-1").await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Status {
            status: 401,
            message: "unauthorized".into()
        }
    );
}

#[tokio::test]
async fn test_list_keys_passes_spec_tag() {
    let base = spawn_fake(Shared::default()).await;
    let vault = HttpKeyVault::new(client(&base, ORG_TOKEN));

    let keys = vault.list_keys("vault-1", &KeySpec::Rsa(4096)).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].spec, KeySpec::Rsa(4096));
    assert_eq!(keys[0].vault_id, "vault-1");
}

#[tokio::test]
async fn test_sign_sends_hex_message_and_algorithm() {
    let state = Shared::default();
    let base = spawn_fake(state.clone()).await;
    let vault = HttpKeyVault::new(client(&base, ORG_TOKEN));

    let response = vault
        .sign("vault-1", "key-1", "6162", &SignOptions::with_algorithm("RS256"))
        .await
        .unwrap();
    assert_eq!(response.signature.as_deref(), Some("deadbeef"));

    let requests = state.sign_requests.lock().unwrap();
    assert_eq!(requests[0], json!({"message": "6162", "options": {"algorithm": "RS256"}}));
}

#[tokio::test]
async fn test_sign_response_without_signature() {
    let base = spawn_fake(Shared::default()).await;
    let vault = HttpKeyVault::new(client(&base, ORG_TOKEN));

    let response = vault
        .sign("vault-1", "unsigned", "00", &SignOptions::default())
        .await
        .unwrap();
    assert!(response.signature.is_none());
}

#[tokio::test]
async fn test_sign_is_never_retried() {
    let state = Shared::default();
    let base = spawn_fake(state.clone()).await;
    let vault = HttpKeyVault::new(
        client(&base, ORG_TOKEN).with_retry(RetryPolicy::new(3, Duration::from_millis(1))),
    );

    let err = vault
        .sign("vault-1", "down", "00", &SignOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(state.sign_attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transient_listing_is_retried() {
    let state = Shared::default();
    state.vault_failures_remaining.store(2, Ordering::SeqCst);
    let base = spawn_fake(state.clone()).await;
    let vault = HttpKeyVault::new(
        client(&base, ORG_TOKEN).with_retry(RetryPolicy::new(2, Duration::from_millis(1))),
    );

    let vaults = vault.list_vaults("org-1").await.unwrap();
    assert_eq!(vaults.len(), 2);
    assert_eq!(state.vault_list_attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let state = Shared::default();
    state.vault_failures_remaining.store(5, Ordering::SeqCst);
    let base = spawn_fake(state.clone()).await;
    let vault = HttpKeyVault::new(
        client(&base, ORG_TOKEN).with_retry(RetryPolicy::new(1, Duration::from_millis(1))),
    );

    let err = vault.list_vaults("org-1").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(state.vault_list_attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_request_timeout() {
    let base = spawn_fake(Shared::default()).await;
    let slow = ApiClient::new(format!("{}/slow", base), Duration::from_millis(200))
        .unwrap()
        .with_token(ORG_TOKEN);
    let vault = HttpKeyVault::new(slow);

    let err = vault
        .sign("vault-1", "key-1", "00", &SignOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Timeout(_)), "unexpected error: {:?}", err);
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
async fn test_list_contracts_filters() {
    let base = spawn_fake(Shared::default()).await;
    let registry = HttpRegistry::new(client(&base, APP_TOKEN));

    let contracts = registry.list_contracts("wg-1", "organization-registry").await.unwrap();
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].address, "0xDEF");
    assert_eq!(contracts[0].contract_type.as_deref(), Some("organization-registry"));

    let none = registry.list_contracts("wg-2", "organization-registry").await.unwrap();
    assert!(none.is_empty());
}

// =============================================================================
// Identity
// =============================================================================

#[tokio::test]
async fn test_organization_details() {
    let base = spawn_fake(Shared::default()).await;
    let identity = HttpIdentity::new(client(&base, ORG_TOKEN), client(&base, APP_TOKEN));

    let org = identity.organization_details("org-1").await.unwrap();
    assert_eq!(org.messaging_endpoint(), Some("nats://org-1:4222"));

    let err = identity.organization_details("org-404").await.unwrap_err();
    assert_eq!(err, ServiceError::NotFound("organization not found".into()));
}

#[tokio::test]
async fn test_organization_id_cannot_reshape_the_path() {
    let base = spawn_fake(Shared::default()).await;
    let identity = HttpIdentity::new(client(&base, ORG_TOKEN), client(&base, APP_TOKEN));

    // Reaches the organization route as one literal id, never org-1
    for id in ["org-1?evil=1", "x/../org-1", "org-1#frag", "org-1/"] {
        let err = identity.organization_details(id).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::NotFound("organization not found".into()),
            "{:?} resolved to an organization",
            id
        );
    }

    // Refused before any request is sent
    for id in ["", ".", ".."] {
        let err = identity.organization_details(id).await.unwrap_err();
        assert!(err.is_not_found(), "{:?} resolved to an organization", id);
    }
}

#[tokio::test]
async fn test_key_id_stays_one_segment() {
    let state = Shared::default();
    let base = spawn_fake(state.clone()).await;
    let vault = HttpKeyVault::new(client(&base, ORG_TOKEN));

    vault
        .sign("vault-1", "down/../key-1", "00", &SignOptions::default())
        .await
        .unwrap();
    assert_eq!(*state.signed_keys.lock().unwrap(), vec!["down/../key-1".to_string()]);

    let err = vault
        .sign("vault-1", "..", "00", &SignOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(state.sign_attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_invitation_uses_application_token() {
    let state = Shared::default();
    let base = spawn_fake(state.clone()).await;
    let identity = HttpIdentity::new(client(&base, ORG_TOKEN), client(&base, APP_TOKEN));

    identity.create_invitation(&payload("new@b.com")).await.unwrap();

    let invitations = state.invitations.lock().unwrap();
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0]["application_id"], "wg-1");
    assert_eq!(invitations[0]["email"], "new@b.com");
    assert_eq!(invitations[0]["params"]["authorized_bearer_token"], "a.b.c");
    assert_eq!(invitations[0]["params"]["workgroup_id"], "wg-1");
    assert_eq!(invitations[0]["params"]["managed_tenant"], true);
}

#[tokio::test]
async fn test_create_invitation_surfaces_service_message() {
    let base = spawn_fake(Shared::default()).await;
    let identity = HttpIdentity::new(client(&base, ORG_TOKEN), client(&base, APP_TOKEN));

    let err = identity.create_invitation(&payload("taken@b.com")).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Status {
            status: 422,
            message: "user already invited".into()
        }
    );
}
