//! Invitation Issuer Server Binary
//!
//! Runs the HTTP server that issues and delivers workgroup invitations.

use std::env;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use invite_connectors::{ApiClient, HttpIdentity, HttpKeyVault, HttpRegistry};
use invite_issuer::{create_router, AppState, InvitationIssuer, IssuerConfig};

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("INVITE_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = IssuerConfig::from_env().expect("Invalid configuration");

    // Organization-scoped calls: vault and organization lookups
    let organization_client = |base_url: &str| {
        ApiClient::new(base_url, config.request_timeout)
            .map(|c| c.with_token(&config.organization_token).with_retry(config.retry))
            .expect("Failed to build HTTP client")
    };
    // Application-scoped calls: registry listing and invitation creation
    let application_client = |base_url: &str| {
        ApiClient::new(base_url, config.request_timeout)
            .map(|c| c.with_token(&config.application_token).with_retry(config.retry))
            .expect("Failed to build HTTP client")
    };

    let vault = Arc::new(HttpKeyVault::new(organization_client(&config.vault_url)));
    let registry = Arc::new(HttpRegistry::new(application_client(&config.registry_url)));
    let identity = Arc::new(HttpIdentity::new(
        organization_client(&config.ident_url),
        application_client(&config.ident_url),
    ));

    let issuer = InvitationIssuer::new(vault, registry, identity)
        .with_signing_spec(config.signing_spec.clone())
        .with_selection_policy(config.selection_policy)
        .with_access_scope(config.access_scope.clone())
        .with_deadline(config.pipeline_deadline);

    info!(
        port = config.port,
        vault_url = %config.vault_url,
        registry_url = %config.registry_url,
        ident_url = %config.ident_url,
        signing_spec = %config.signing_spec,
        selection_policy = %config.selection_policy,
        "Starting invitation issuer"
    );

    let state = Arc::new(AppState { issuer });
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Invitation issuer listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
