//! Invitation claim set
//!
//! Wire shape (before encoding):
//!
//! ```text
//! {aud, iat, iss, sub, jti,
//!  baseline: {invitor_organization_address, registry_contract_address,
//!             workgroup_id, authorized_bearer_token?, organization_id?,
//!             organization_name?},
//!  accessScope?: {permissions: {publish?, subscribe?, responses?}}}
//! ```
//!
//! Optional fields are omitted rather than serialized empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InvitationError, Result};
use crate::scope::{AccessScopeClaims, AccessScopePolicy};
use crate::types::OrganizationContext;

/// Claim key of the nested workgroup parameters
pub const BASELINE_CLAIM_KEY: &str = "baseline";

/// Prefix of the `iss` claim
pub const ISSUER_PREFIX: &str = "organization:";

/// Workgroup parameters nested under `baseline`
///
/// The same object, extended with the signed token, is handed to the
/// identity service as the invitation `params`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineParams {
    pub invitor_organization_address: String,

    pub registry_contract_address: String,

    pub workgroup_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_bearer_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
}

impl BaselineParams {
    /// Create the always-present parameters
    pub fn new(
        invitor_organization_address: impl Into<String>,
        registry_contract_address: impl Into<String>,
        workgroup_id: impl Into<String>,
    ) -> Self {
        Self {
            invitor_organization_address: invitor_organization_address.into(),
            registry_contract_address: registry_contract_address.into(),
            workgroup_id: workgroup_id.into(),
            authorized_bearer_token: None,
            organization_id: None,
            organization_name: None,
        }
    }

    /// Set the organization id unless it is blank
    pub fn with_organization_id(mut self, organization_id: Option<String>) -> Self {
        self.organization_id = non_empty(organization_id);
        self
    }

    /// Set the organization name unless it is blank
    pub fn with_organization_name(mut self, organization_name: Option<String>) -> Self {
        self.organization_name = non_empty(organization_name);
        self
    }

    /// Embed the signed token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.authorized_bearer_token = Some(token.into());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The full invitation claim set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationClaims {
    /// Messaging endpoint of the inviting organization
    pub aud: String,

    /// Issued at (seconds since the epoch)
    pub iat: i64,

    /// `organization:<id>`
    pub iss: String,

    /// Invitee email
    pub sub: String,

    /// Unique token id
    pub jti: String,

    pub baseline: BaselineParams,

    #[serde(rename = "accessScope", default, skip_serializing_if = "Option::is_none")]
    pub access_scope: Option<AccessScopeClaims>,
}

/// Builder for `InvitationClaims`
pub struct ClaimsBuilder<'a> {
    context: &'a OrganizationContext,
    workgroup_id: String,
    email: String,
    organization_id: Option<String>,
    organization_name: Option<String>,
    access_scope: AccessScopePolicy,
    issued_at: Option<DateTime<Utc>>,
    token_id: Option<String>,
}

impl<'a> ClaimsBuilder<'a> {
    /// Start building claims for an invitee of a workgroup
    pub fn new(
        context: &'a OrganizationContext,
        workgroup_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            context,
            workgroup_id: workgroup_id.into(),
            email: email.into(),
            organization_id: None,
            organization_name: None,
            access_scope: AccessScopePolicy::default(),
            issued_at: None,
            token_id: None,
        }
    }

    /// Organization id to embed (omitted if blank)
    pub fn organization_id(mut self, organization_id: Option<String>) -> Self {
        self.organization_id = organization_id;
        self
    }

    /// Organization name to embed (omitted if blank)
    pub fn organization_name(mut self, organization_name: Option<String>) -> Self {
        self.organization_name = organization_name;
        self
    }

    /// Access-scope policy (defaults to `AccessScopePolicy::default()`)
    pub fn access_scope(mut self, policy: AccessScopePolicy) -> Self {
        self.access_scope = policy;
        self
    }

    /// Override the issue time (defaults to now)
    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Override the token id (defaults to a random UUID)
    pub fn token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    /// Build the claims
    pub fn build(self) -> Result<InvitationClaims> {
        if self.email.trim().is_empty() {
            return Err(InvitationError::InvalidRequest("email is required".into()));
        }
        if self.workgroup_id.trim().is_empty() {
            return Err(InvitationError::InvalidRequest("workgroup_id is required".into()));
        }

        let baseline = BaselineParams::new(
            self.context.invitor_address.clone(),
            self.context.registry_contract_address.clone(),
            self.workgroup_id,
        )
        .with_organization_id(self.organization_id)
        .with_organization_name(self.organization_name);

        let issued_at = self.issued_at.unwrap_or_else(Utc::now);

        Ok(InvitationClaims {
            aud: self.context.messaging_endpoint.clone(),
            iat: issued_at.timestamp(),
            iss: format!("{}{}", ISSUER_PREFIX, self.context.organization_id),
            sub: self.email,
            jti: self.token_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            baseline,
            access_scope: self.access_scope.to_claims(),
        })
    }
}
