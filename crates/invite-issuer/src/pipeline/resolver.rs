//! Organization context resolution
//!
//! Gathers, for one invitation, everything the claims and the signature
//! depend on: the invitor address, the signing key, the workgroup registry
//! contract and the organization's messaging endpoint. Nothing is cached;
//! every invitation re-resolves from the services.

use std::sync::Arc;
use tracing::{debug, info};

use invite_connectors::{IdentityService, KeyVaultService, RegistryService, ServiceError};
use invite_core::{
    KeySpec, OrganizationContext, ResolutionError, SelectionPolicy, SigningKey,
};

/// Contract type identifying a workgroup's organization registry
pub const REGISTRY_CONTRACT_TYPE: &str = "organization-registry";

/// Resolves the inviting organization's context
pub struct ContextResolver {
    vault: Arc<dyn KeyVaultService>,
    registry: Arc<dyn RegistryService>,
    identity: Arc<dyn IdentityService>,
    signing_spec: KeySpec,
    policy: SelectionPolicy,
}

impl ContextResolver {
    /// Create a resolver selecting `RSA-4096` signing keys, earliest first
    pub fn new(
        vault: Arc<dyn KeyVaultService>,
        registry: Arc<dyn RegistryService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            vault,
            registry,
            identity,
            signing_spec: KeySpec::Rsa(4096),
            policy: SelectionPolicy::default(),
        }
    }

    /// Select signing keys of a different spec
    pub fn with_signing_spec(mut self, spec: KeySpec) -> Self {
        self.signing_spec = spec;
        self
    }

    /// Use a different policy when a listing returns several candidates
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Spec of the keys selected for signing
    pub fn signing_spec(&self) -> &KeySpec {
        &self.signing_spec
    }

    /// Resolve the context of `organization_id` inviting into `application_id`
    pub async fn resolve(
        &self,
        organization_id: &str,
        application_id: &str,
    ) -> Result<OrganizationContext, ResolutionError> {
        let vaults = listing(self.vault.list_vaults(organization_id).await)
            .map_err(transport("list vaults"))?;
        let vault = self
            .policy
            .select(vaults)
            .ok_or_else(|| ResolutionError::NoVault {
                organization_id: organization_id.to_string(),
            })?;
        debug!(organization_id = %organization_id, vault_id = %vault.id, "Selected vault");

        let address_keys: Vec<SigningKey> = self
            .list_keys(&vault.id, &KeySpec::Secp256k1)
            .await?
            .into_iter()
            .filter(|k| k.address.as_deref().is_some_and(|a| !a.trim().is_empty()))
            .collect();
        let invitor_address = self
            .policy
            .select(address_keys)
            .and_then(|k| k.address)
            .ok_or_else(|| ResolutionError::NoKey {
                vault_id: vault.id.clone(),
                spec: KeySpec::Secp256k1.tag(),
            })?;

        let signing_keys = self.list_keys(&vault.id, &self.signing_spec).await?;
        let signing_key = self
            .policy
            .select(signing_keys)
            .ok_or_else(|| ResolutionError::NoKey {
                vault_id: vault.id.clone(),
                spec: self.signing_spec.tag(),
            })?;
        debug!(vault_id = %vault.id, key_id = %signing_key.id, spec = %signing_key.spec, "Selected signing key");

        let contracts: Vec<_> = listing(
            self.registry
                .list_contracts(application_id, REGISTRY_CONTRACT_TYPE)
                .await,
        )
        .map_err(transport("list registry contracts"))?
        .into_iter()
        .filter(|c| {
            c.contract_type
                .as_deref()
                .map_or(true, |t| t == REGISTRY_CONTRACT_TYPE)
        })
        .collect();
        let contract = self
            .policy
            .select(contracts)
            .ok_or_else(|| ResolutionError::NoContract {
                application_id: application_id.to_string(),
                contract_type: REGISTRY_CONTRACT_TYPE.to_string(),
            })?;

        let organization = match self.identity.organization_details(organization_id).await {
            Ok(organization) => organization,
            Err(ServiceError::NotFound(_)) => {
                return Err(ResolutionError::UnknownOrganization {
                    organization_id: organization_id.to_string(),
                })
            }
            Err(err) => return Err(transport("fetch organization details")(err)),
        };
        let messaging_endpoint = organization
            .messaging_endpoint()
            .map(String::from)
            .ok_or_else(|| ResolutionError::NoMessagingEndpoint {
                organization_id: organization_id.to_string(),
            })?;

        info!(
            organization_id = %organization_id,
            application_id = %application_id,
            vault_id = %vault.id,
            key_id = %signing_key.id,
            registry_contract = %contract.address,
            "Resolved organization context"
        );

        Ok(OrganizationContext {
            organization_id: organization_id.to_string(),
            messaging_endpoint,
            registry_contract_address: contract.address,
            invitor_address,
            signing_key,
        })
    }

    /// List keys of one spec, dropping any the service returned for another spec
    async fn list_keys(
        &self,
        vault_id: &str,
        spec: &KeySpec,
    ) -> Result<Vec<SigningKey>, ResolutionError> {
        let keys = listing(self.vault.list_keys(vault_id, spec).await)
            .map_err(transport("list vault keys"))?;
        Ok(keys.into_iter().filter(|k| &k.spec == spec).collect())
    }
}

/// A 404 on a listing means nothing matched
fn listing<T>(result: Result<Vec<T>, ServiceError>) -> Result<Vec<T>, ServiceError> {
    match result {
        Err(ServiceError::NotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}

fn transport(operation: &'static str) -> impl FnOnce(ServiceError) -> ResolutionError {
    move |err| ResolutionError::Transport {
        operation: operation.to_string(),
        transient: err.is_transient(),
        message: err.to_string(),
    }
}
