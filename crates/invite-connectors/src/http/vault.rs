//! Key-vault service client

use async_trait::async_trait;
use serde::Serialize;

use invite_core::{KeySpec, SigningKey, Vault};

use crate::error::Result;
use crate::http::client::ApiClient;
use crate::services::{KeyVaultService, SignOptions, SignResponse};

/// Body of a signing request
#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    message: &'a str,
    options: &'a SignOptions,
}

/// Key vault reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpKeyVault {
    client: ApiClient,
}

impl HttpKeyVault {
    /// Create a vault client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyVaultService for HttpKeyVault {
    async fn list_vaults(&self, organization_id: &str) -> Result<Vec<Vault>> {
        self.client
            .get_json(&["api", "v1", "vaults"], &[("organization_id", organization_id)])
            .await
    }

    async fn list_keys(&self, vault_id: &str, spec: &KeySpec) -> Result<Vec<SigningKey>> {
        let spec = spec.tag();
        self.client
            .get_json(
                &["api", "v1", "vaults", vault_id, "keys"],
                &[("spec", spec.as_str())],
            )
            .await
    }

    async fn sign(
        &self,
        vault_id: &str,
        key_id: &str,
        message_hex: &str,
        options: &SignOptions,
    ) -> Result<SignResponse> {
        let request = SignRequest {
            message: message_hex,
            options,
        };
        self.client
            .post_json(&["api", "v1", "vaults", vault_id, "keys", key_id, "sign"], &request)
            .await
    }

    fn description(&self) -> &str {
        "HTTP key vault"
    }
}
