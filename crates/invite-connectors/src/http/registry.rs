//! Registry (ledger) service client

use async_trait::async_trait;

use invite_core::RegistryContract;

use crate::error::Result;
use crate::http::client::ApiClient;
use crate::services::RegistryService;

/// Contract registry reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: ApiClient,
}

impl HttpRegistry {
    /// Create a registry client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryService for HttpRegistry {
    async fn list_contracts(
        &self,
        application_id: &str,
        contract_type: &str,
    ) -> Result<Vec<RegistryContract>> {
        self.client
            .get_json(
                &["api", "v1", "contracts"],
                &[("application_id", application_id), ("type", contract_type)],
            )
            .await
    }

    fn description(&self) -> &str {
        "HTTP registry"
    }
}
