//! Identity service client
//!
//! Organization lookups use the organization's token while invitations are
//! created with the workgroup's application token, so this client holds two
//! `ApiClient`s against the same service.

use async_trait::async_trait;

use invite_core::{InvitationPayload, OrganizationDetails};

use crate::error::Result;
use crate::http::client::ApiClient;
use crate::services::IdentityService;

/// Identity service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpIdentity {
    organization_client: ApiClient,
    application_client: ApiClient,
}

impl HttpIdentity {
    /// Create an identity client
    ///
    /// `organization_client` fetches organization details;
    /// `application_client` creates invitations.
    pub fn new(organization_client: ApiClient, application_client: ApiClient) -> Self {
        Self {
            organization_client,
            application_client,
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentity {
    async fn organization_details(&self, organization_id: &str) -> Result<OrganizationDetails> {
        self.organization_client
            .get_json(&["api", "v1", "organizations", organization_id], &[])
            .await
    }

    async fn create_invitation(&self, invitation: &InvitationPayload) -> Result<()> {
        self.application_client.post(&["api", "v1", "invitations"], invitation).await
    }

    fn description(&self) -> &str {
        "HTTP identity"
    }
}
