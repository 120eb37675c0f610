//! Invitation issuance pipeline
//!
//! One invitation runs the stages in order:
//!
//! ```text
//! Resolving → BuildingClaims → Signing → Assembling → Dispatching → Dispatched
//! ```
//!
//! A failure at any stage aborts the rest; nothing later runs. The whole run
//! is bounded by a deadline, and dropping the future cancels any call still
//! in flight.
//!
//! Issuance is not atomic with delivery. A dispatch failure after signing
//! leaves a valid token behind, so the error carries its `jti` for
//! revocation. The token itself is never logged.

pub mod dispatcher;
pub mod resolver;

pub use dispatcher::InvitationDispatcher;
pub use resolver::{ContextResolver, REGISTRY_CONTRACT_TYPE};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use invite_connectors::{IdentityService, KeyVaultService, RegistryService};
use invite_core::{
    assemble, token_header, AccessScopePolicy, AlgorithmTable, ClaimsBuilder, CompactToken,
    InvitationError, InvitationParams, InvitationPayload, InvitationRequest, KeySpec, Result,
    SelectionPolicy, SigningInput,
};

use crate::keys::RemoteSigner;

/// Default bound on one invitation run
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Resolving,
    BuildingClaims,
    Signing,
    Assembling,
    Dispatching,
    Dispatched,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Resolving => "resolving",
            PipelineStage::BuildingClaims => "building_claims",
            PipelineStage::Signing => "signing",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Dispatching => "dispatching",
            PipelineStage::Dispatched => "dispatched",
        };
        write!(f, "{}", name)
    }
}

/// A delivered invitation
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    pub email: String,
    pub workgroup_id: String,
    /// Unique id of the signed token
    pub jti: String,
    pub token: CompactToken,
}

/// Issues and delivers workgroup invitations
pub struct InvitationIssuer {
    resolver: ContextResolver,
    signer: RemoteSigner,
    dispatcher: InvitationDispatcher,
    access_scope: AccessScopePolicy,
    deadline: Duration,
}

impl InvitationIssuer {
    /// Create an issuer with default policies
    pub fn new(
        vault: Arc<dyn KeyVaultService>,
        registry: Arc<dyn RegistryService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        info!(
            vault = %vault.description(),
            registry = %registry.description(),
            identity = %identity.description(),
            "Invitation issuer initialized"
        );

        Self {
            resolver: ContextResolver::new(vault.clone(), registry, identity.clone()),
            signer: RemoteSigner::new(vault),
            dispatcher: InvitationDispatcher::new(identity),
            access_scope: AccessScopePolicy::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Sign with keys of this spec
    pub fn with_signing_spec(mut self, spec: KeySpec) -> Self {
        self.resolver = self.resolver.with_signing_spec(spec);
        self
    }

    /// Pick among several vaults, keys or contracts with this policy
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.resolver = self.resolver.with_policy(policy);
        self
    }

    /// Embed this access scope in every token
    pub fn with_access_scope(mut self, access_scope: AccessScopePolicy) -> Self {
        self.access_scope = access_scope;
        self
    }

    /// Map key specs to algorithms with this table
    pub fn with_algorithms(mut self, algorithms: AlgorithmTable) -> Self {
        self.signer = self.signer.with_algorithms(algorithms);
        self
    }

    /// Bound each invitation run by `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Spec of the keys invitations are signed with
    pub fn signing_spec(&self) -> &KeySpec {
        self.resolver.signing_spec()
    }

    /// Issue a token for the invitee and deliver the invitation
    pub async fn invite(&self, request: &InvitationRequest) -> Result<IssuedInvitation> {
        request.validate()?;

        match tokio::time::timeout(self.deadline, self.run(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    organization_id = %request.organization_id,
                    workgroup_id = %request.workgroup_id,
                    deadline = ?self.deadline,
                    "Invitation pipeline timed out"
                );
                Err(InvitationError::DeadlineExceeded(self.deadline))
            }
        }
    }

    async fn run(&self, request: &InvitationRequest) -> Result<IssuedInvitation> {
        enter(request, PipelineStage::Resolving);
        let context = self
            .resolver
            .resolve(&request.organization_id, &request.workgroup_id)
            .await?;

        enter(request, PipelineStage::BuildingClaims);
        let claims = ClaimsBuilder::new(&context, &request.workgroup_id, &request.email)
            .organization_id(Some(request.organization_id.clone()))
            .organization_name(request.organization_name.clone())
            .access_scope(self.access_scope.clone())
            .build()?;

        enter(request, PipelineStage::Signing);
        let algorithm = self.signer.algorithm_for(&context.signing_key)?;
        let header = token_header(algorithm, &context.signing_key.id);
        let input = SigningInput::new(&header, &claims)?;
        let signature = self.signer.sign(&input, &context.signing_key).await?;

        enter(request, PipelineStage::Assembling);
        let token = assemble(&input, &signature);

        enter(request, PipelineStage::Dispatching);
        let payload = InvitationPayload {
            application_id: request.workgroup_id.clone(),
            email: request.email.clone(),
            params: InvitationParams {
                baseline: claims.baseline.clone().with_bearer_token(token.as_str()),
                managed_tenant: request.managed_tenant,
            },
        };
        if let Err(err) = self.dispatcher.dispatch(&payload).await {
            warn!(
                jti = %claims.jti,
                email = %request.email,
                workgroup_id = %request.workgroup_id,
                "Signed invitation token was not delivered and should be revoked"
            );
            return Err(err.with_token_id(claims.jti).into());
        }

        enter(request, PipelineStage::Dispatched);
        info!(
            jti = %claims.jti,
            email = %request.email,
            workgroup_id = %request.workgroup_id,
            organization_id = %request.organization_id,
            "Invitation issued"
        );

        Ok(IssuedInvitation {
            email: request.email.clone(),
            workgroup_id: request.workgroup_id.clone(),
            jti: claims.jti,
            token,
        })
    }
}

fn enter(request: &InvitationRequest, stage: PipelineStage) {
    debug!(
        email = %request.email,
        workgroup_id = %request.workgroup_id,
        stage = %stage,
        "Invitation pipeline stage"
    );
}
