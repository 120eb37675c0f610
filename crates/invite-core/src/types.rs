//! Common types shared by the invitation pipeline and its service clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::claims::BaselineParams;
use crate::error::{InvitationError, Result};
use crate::select::Listed;

/// Metadata key holding an organization's messaging endpoint
pub const MESSAGING_ENDPOINT_METADATA_KEY: &str = "messaging_endpoint";

/// Key spec tag as reported by the key vault (e.g. `RSA-4096`, `secp256k1`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeySpec {
    /// RSA with the given modulus size in bits
    Rsa(u16),
    /// secp256k1 elliptic curve (used for on-chain addresses)
    Secp256k1,
    /// NIST P-256 elliptic curve
    P256,
    /// Ed25519
    Ed25519,
    /// Any tag this crate does not recognize, kept verbatim
    Other(String),
}

/// Algorithm family of a key spec
///
/// All RSA sizes share one family, so an algorithm mapping registered for
/// the family covers every size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Rsa,
    Secp256k1,
    P256,
    Ed25519,
    Other(String),
}

impl KeySpec {
    /// The family this spec belongs to
    pub fn family(&self) -> KeyFamily {
        match self {
            KeySpec::Rsa(_) => KeyFamily::Rsa,
            KeySpec::Secp256k1 => KeyFamily::Secp256k1,
            KeySpec::P256 => KeyFamily::P256,
            KeySpec::Ed25519 => KeyFamily::Ed25519,
            KeySpec::Other(tag) => KeyFamily::Other(tag.clone()),
        }
    }

    /// The wire tag for this spec
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Rsa(bits) => write!(f, "RSA-{}", bits),
            KeySpec::Secp256k1 => write!(f, "secp256k1"),
            KeySpec::P256 => write!(f, "P-256"),
            KeySpec::Ed25519 => write!(f, "Ed25519"),
            KeySpec::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// Only canonical tags parse to a known spec, so every spec displays as the
/// tag it was read from. Anything else is kept verbatim as `Other`.
impl From<&str> for KeySpec {
    fn from(tag: &str) -> Self {
        if let Some(bits) = tag.strip_prefix("RSA-") {
            let canonical = !bits.starts_with('0') && bits.bytes().all(|b| b.is_ascii_digit());
            if let (true, Ok(bits)) = (canonical, bits.parse::<u16>()) {
                return KeySpec::Rsa(bits);
            }
        }
        match tag {
            "secp256k1" => KeySpec::Secp256k1,
            "P-256" => KeySpec::P256,
            "Ed25519" => KeySpec::Ed25519,
            _ => KeySpec::Other(tag.to_string()),
        }
    }
}

impl From<String> for KeySpec {
    fn from(tag: String) -> Self {
        KeySpec::from(tag.as_str())
    }
}

impl From<KeySpec> for String {
    fn from(spec: KeySpec) -> Self {
        spec.to_string()
    }
}

impl FromStr for KeySpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(KeySpec::from(s))
    }
}

/// A key vault owned by an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Vault {
    /// Create a vault record
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            created_at: None,
        }
    }

    /// Set the creation time
    pub fn created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// A key held by the custodial vault
///
/// Only public metadata is represented; private material never leaves the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    pub id: String,

    pub vault_id: String,

    pub spec: KeySpec,

    /// Derived public address or fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SigningKey {
    /// Create a key record
    pub fn new(id: impl Into<String>, vault_id: impl Into<String>, spec: KeySpec) -> Self {
        Self {
            id: id.into(),
            vault_id: vault_id.into(),
            spec,
            address: None,
            created_at: None,
        }
    }

    /// Set the derived address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the creation time
    pub fn created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// A registry contract deployed for a workgroup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryContract {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub address: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RegistryContract {
    /// Create a contract record
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            id: None,
            address: address.into(),
            contract_type: None,
            created_at: None,
        }
    }

    /// Set the contract type
    pub fn with_type(mut self, contract_type: impl Into<String>) -> Self {
        self.contract_type = Some(contract_type.into());
        self
    }

    /// Set the creation time
    pub fn created(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

impl Listed for Vault {
    fn listing_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Listed for SigningKey {
    fn listing_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Listed for RegistryContract {
    fn listing_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.address)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Organization details as returned by the identity service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDetails {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl OrganizationDetails {
    /// Create organization details with empty metadata
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the messaging endpoint metadata entry
    pub fn with_messaging_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata.insert(
            MESSAGING_ENDPOINT_METADATA_KEY.into(),
            serde_json::Value::String(endpoint.into()),
        );
        self
    }

    /// The registered messaging endpoint, if present and non-empty
    pub fn messaging_endpoint(&self) -> Option<&str> {
        self.metadata
            .get(MESSAGING_ENDPOINT_METADATA_KEY)
            .and_then(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Everything the claim builder and signer need about the inviting organization
///
/// Built once per invitation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationContext {
    pub organization_id: String,
    pub messaging_endpoint: String,
    pub registry_contract_address: String,
    pub invitor_address: String,
    pub signing_key: SigningKey,
}

/// An invitation request, threaded unchanged through every pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRequest {
    /// Workgroup (application) the invitee joins
    pub workgroup_id: String,

    /// Inviting organization
    pub organization_id: String,

    /// Invitee contact
    pub email: String,

    /// Display name for the invited organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,

    /// Invitee may use operator-provided infrastructure
    #[serde(default)]
    pub managed_tenant: bool,
}

impl InvitationRequest {
    /// Create a new request
    pub fn new(
        workgroup_id: impl Into<String>,
        organization_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            workgroup_id: workgroup_id.into(),
            organization_id: organization_id.into(),
            email: email.into(),
            organization_name: None,
            managed_tenant: false,
        }
    }

    /// Set the organization display name
    pub fn with_organization_name(mut self, name: impl Into<String>) -> Self {
        self.organization_name = Some(name.into());
        self
    }

    /// Set the managed-tenant flag
    pub fn managed_tenant(mut self, managed_tenant: bool) -> Self {
        self.managed_tenant = managed_tenant;
        self
    }

    /// Check that the required fields are present
    pub fn validate(&self) -> Result<()> {
        if self.workgroup_id.trim().is_empty() {
            return Err(InvitationError::InvalidRequest("workgroup_id is required".into()));
        }
        if self.organization_id.trim().is_empty() {
            return Err(InvitationError::InvalidRequest("organization_id is required".into()));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(InvitationError::InvalidRequest("email is required".into()));
        }
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            }
            None => false,
        };
        if !well_formed {
            return Err(InvitationError::InvalidRequest(format!(
                "'{}' is not an email address",
                email
            )));
        }
        Ok(())
    }
}

/// Parameters sent to the identity service alongside the invitee email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationParams {
    #[serde(flatten)]
    pub baseline: BaselineParams,

    #[serde(default, skip_serializing_if = "is_false")]
    pub managed_tenant: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Body of the identity service's create-invitation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationPayload {
    pub application_id: String,
    pub email: String,
    pub params: InvitationParams,
}
