//! Service contracts consumed by the invitation pipeline
//!
//! Each trait is one external system. Implementations must be safe for
//! concurrent use: the pipeline shares them across invitations behind `Arc`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use invite_core::{
    InvitationPayload, KeySpec, OrganizationDetails, RegistryContract, SigningKey, Vault,
};

use crate::error::Result;

/// Options sent with a signing request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOptions {
    /// JWS algorithm name (e.g. `RS256`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl SignOptions {
    /// Options requesting a specific algorithm
    pub fn with_algorithm(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: Some(algorithm.into()),
        }
    }
}

/// Vault response to a signing request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    /// Hex-encoded signature
    #[serde(default)]
    pub signature: Option<String>,
}

/// Custodial key-management service
#[async_trait]
pub trait KeyVaultService: Send + Sync {
    /// List the organization's vaults
    async fn list_vaults(&self, organization_id: &str) -> Result<Vec<Vault>>;

    /// List keys of a vault, filtered by spec
    async fn list_keys(&self, vault_id: &str, spec: &KeySpec) -> Result<Vec<SigningKey>>;

    /// Sign a hex-encoded message with a vault key
    async fn sign(
        &self,
        vault_id: &str,
        key_id: &str,
        message_hex: &str,
        options: &SignOptions,
    ) -> Result<SignResponse>;

    /// Get a description of this service (for logging)
    fn description(&self) -> &str {
        "key vault"
    }
}

/// Registry/ledger service holding workgroup contracts
#[async_trait]
pub trait RegistryService: Send + Sync {
    /// List contracts deployed for a workgroup, filtered by type
    async fn list_contracts(
        &self,
        application_id: &str,
        contract_type: &str,
    ) -> Result<Vec<RegistryContract>>;

    /// Get a description of this service (for logging)
    fn description(&self) -> &str {
        "registry"
    }
}

/// Identity service owning organizations and invitation delivery
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Fetch organization details
    async fn organization_details(&self, organization_id: &str) -> Result<OrganizationDetails>;

    /// Create (and deliver) an invitation
    async fn create_invitation(&self, invitation: &InvitationPayload) -> Result<()>;

    /// Get a description of this service (for logging)
    fn description(&self) -> &str {
        "identity"
    }
}
