//! In-memory service implementations
//!
//! Used for tests and local development. The vault signs with Ed25519 keys it
//! generates itself, whatever spec a key is registered under, so tokens it
//! signs verify against the key returned by `add_key`.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey as Ed25519Key, VerifyingKey};
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::info;

use invite_core::{
    InvitationPayload, KeySpec, OrganizationDetails, RegistryContract, SigningKey, Vault,
};

use crate::error::{Result, ServiceError};
use crate::services::{
    IdentityService, KeyVaultService, RegistryService, SignOptions, SignResponse,
};

// =============================================================================
// Key Vault
// =============================================================================

/// In-memory key vault
pub struct InMemoryKeyVault {
    vaults: RwLock<HashMap<String, Vec<Vault>>>,
    keys: RwLock<Vec<SigningKey>>,
    signers: RwLock<HashMap<String, Ed25519Key>>,
    listing_failure: RwLock<Option<ServiceError>>,
    signing_failure: RwLock<Option<ServiceError>>,
    sign_calls: AtomicUsize,
}

impl InMemoryKeyVault {
    /// Create an empty vault service
    pub fn new() -> Self {
        Self {
            vaults: RwLock::new(HashMap::new()),
            keys: RwLock::new(Vec::new()),
            signers: RwLock::new(HashMap::new()),
            listing_failure: RwLock::new(None),
            signing_failure: RwLock::new(None),
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// Register a vault for an organization
    pub fn add_vault(&self, organization_id: impl Into<String>, vault: Vault) {
        let mut vaults = self.vaults.write().unwrap();
        vaults.entry(organization_id.into()).or_default().push(vault);
    }

    /// Register a key and return the public half of its signing key
    pub fn add_key(&self, key: SigningKey) -> VerifyingKey {
        let signer = Ed25519Key::generate(&mut OsRng);
        let verifying_key = signer.verifying_key();

        self.signers.write().unwrap().insert(key.id.clone(), signer);
        info!(key_id = %key.id, spec = %key.spec, "Registered in-memory vault key");
        self.keys.write().unwrap().push(key);

        verifying_key
    }

    /// Make every listing call fail with `error`
    pub fn fail_listing(&self, error: ServiceError) {
        *self.listing_failure.write().unwrap() = Some(error);
    }

    /// Make every signing call fail with `error`
    pub fn fail_signing(&self, error: ServiceError) {
        *self.signing_failure.write().unwrap() = Some(error);
    }

    /// Number of signing calls received
    pub fn sign_count(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn check_listing(&self) -> Result<()> {
        match self.listing_failure.read().unwrap().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryKeyVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyVaultService for InMemoryKeyVault {
    async fn list_vaults(&self, organization_id: &str) -> Result<Vec<Vault>> {
        self.check_listing()?;
        let vaults = self.vaults.read().unwrap();
        Ok(vaults.get(organization_id).cloned().unwrap_or_default())
    }

    async fn list_keys(&self, vault_id: &str, spec: &KeySpec) -> Result<Vec<SigningKey>> {
        self.check_listing()?;
        let keys = self.keys.read().unwrap();
        Ok(keys
            .iter()
            .filter(|k| k.vault_id == vault_id && &k.spec == spec)
            .cloned()
            .collect())
    }

    async fn sign(
        &self,
        vault_id: &str,
        key_id: &str,
        message_hex: &str,
        _options: &SignOptions,
    ) -> Result<SignResponse> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.signing_failure.read().unwrap().as_ref() {
            return Err(err.clone());
        }

        let known = self
            .keys
            .read()
            .unwrap()
            .iter()
            .any(|k| k.id == key_id && k.vault_id == vault_id);
        if !known {
            return Err(ServiceError::NotFound(format!(
                "key {} in vault {}",
                key_id, vault_id
            )));
        }

        let message = hex::decode(message_hex).map_err(|e| ServiceError::Status {
            status: 422,
            message: format!("message is not hex: {}", e),
        })?;

        let signers = self.signers.read().unwrap();
        let signer = signers
            .get(key_id)
            .ok_or_else(|| ServiceError::NotFound(format!("key {}", key_id)))?;
        let signature = signer.sign(&message);

        Ok(SignResponse {
            signature: Some(hex::encode(signature.to_bytes())),
        })
    }

    fn description(&self) -> &str {
        "in-memory key vault"
    }
}

// =============================================================================
// Registry
// =============================================================================

/// In-memory contract registry
pub struct InMemoryRegistry {
    contracts: RwLock<HashMap<String, Vec<RegistryContract>>>,
    failure: RwLock<Option<ServiceError>>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            contracts: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
        }
    }

    /// Register a contract for a workgroup
    pub fn add_contract(&self, application_id: impl Into<String>, contract: RegistryContract) {
        let mut contracts = self.contracts.write().unwrap();
        contracts.entry(application_id.into()).or_default().push(contract);
    }

    /// Make every listing call fail with `error`
    pub fn fail_listing(&self, error: ServiceError) {
        *self.failure.write().unwrap() = Some(error);
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryService for InMemoryRegistry {
    async fn list_contracts(
        &self,
        application_id: &str,
        contract_type: &str,
    ) -> Result<Vec<RegistryContract>> {
        if let Some(err) = self.failure.read().unwrap().as_ref() {
            return Err(err.clone());
        }
        let contracts = self.contracts.read().unwrap();
        Ok(contracts
            .get(application_id)
            .map(|list| {
                list.iter()
                    .filter(|c| c.contract_type.as_deref() == Some(contract_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn description(&self) -> &str {
        "in-memory registry"
    }
}

// =============================================================================
// Identity
// =============================================================================

/// In-memory identity service that records invitations instead of sending them
pub struct InMemoryIdentity {
    organizations: RwLock<HashMap<String, OrganizationDetails>>,
    invitations: RwLock<Vec<InvitationPayload>>,
    invitation_failure: RwLock<Option<ServiceError>>,
    invitation_calls: AtomicUsize,
}

impl InMemoryIdentity {
    /// Create an empty identity service
    pub fn new() -> Self {
        Self {
            organizations: RwLock::new(HashMap::new()),
            invitations: RwLock::new(Vec::new()),
            invitation_failure: RwLock::new(None),
            invitation_calls: AtomicUsize::new(0),
        }
    }

    /// Register an organization
    pub fn add_organization(&self, organization: OrganizationDetails) {
        let mut organizations = self.organizations.write().unwrap();
        organizations.insert(organization.id.clone(), organization);
    }

    /// Make every create-invitation call fail with `error`
    pub fn fail_invitations(&self, error: ServiceError) {
        *self.invitation_failure.write().unwrap() = Some(error);
    }

    /// Number of create-invitation calls received, successful or not
    pub fn invitation_calls(&self) -> usize {
        self.invitation_calls.load(Ordering::SeqCst)
    }

    /// Invitations accepted so far
    pub fn invitations(&self) -> Vec<InvitationPayload> {
        self.invitations.read().unwrap().clone()
    }
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentity {
    async fn organization_details(&self, organization_id: &str) -> Result<OrganizationDetails> {
        let organizations = self.organizations.read().unwrap();
        organizations
            .get(organization_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("organization {}", organization_id)))
    }

    async fn create_invitation(&self, invitation: &InvitationPayload) -> Result<()> {
        self.invitation_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.invitation_failure.read().unwrap().as_ref() {
            return Err(err.clone());
        }

        self.invitations.write().unwrap().push(invitation.clone());
        Ok(())
    }

    fn description(&self) -> &str {
        "in-memory identity"
    }
}
