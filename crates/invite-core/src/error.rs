//! Error taxonomy for invitation issuance
//!
//! Each pipeline stage has its own error type so callers can tell which stage
//! aborted an invitation. `InvitationError` is the umbrella returned by the
//! pipeline as a whole.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using InvitationError
pub type Result<T> = std::result::Result<T, InvitationError>;

/// Failure to resolve the inviting organization's context
///
/// "Nothing matched" variants are kept apart from `Transport` so a missing
/// vault is never confused with an unreachable vault service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The organization has no key vault
    #[error("No vault found for organization {organization_id}")]
    NoVault { organization_id: String },

    /// The selected vault holds no key of the requested spec
    #[error("No {spec} key found in vault {vault_id}")]
    NoKey { vault_id: String, spec: String },

    /// No registry contract of the requested type exists for the workgroup
    #[error("No {contract_type} contract found for workgroup {application_id}")]
    NoContract {
        application_id: String,
        contract_type: String,
    },

    /// The identity service does not know the organization
    #[error("Organization {organization_id} not found")]
    UnknownOrganization { organization_id: String },

    /// The organization has not registered a messaging endpoint
    #[error("Organization {organization_id} has no messaging endpoint")]
    NoMessagingEndpoint { organization_id: String },

    /// A lookup call failed
    #[error("Failed to {operation}: {message}")]
    Transport {
        operation: String,
        message: String,
        transient: bool,
    },
}

impl ResolutionError {
    /// Whether the failure means "nothing matched" rather than "call failed"
    pub fn is_not_found(&self) -> bool {
        !matches!(self, ResolutionError::Transport { .. })
    }

    /// Whether retrying the lookup could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolutionError::Transport { transient: true, .. })
    }
}

/// Why the remote signer did not produce a signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningFailure {
    /// No algorithm is mapped for the key's spec
    #[error("no signing algorithm mapped for key spec {0}")]
    UnsupportedSpec(String),

    /// The vault does not know the key
    #[error("key not found")]
    KeyNotFound,

    /// The vault could not be reached or failed internally
    #[error("signing service unavailable: {0}")]
    Unavailable(String),

    /// The vault refused the request
    #[error("signing request rejected: {0}")]
    Rejected(String),

    /// The vault answered without a signature
    #[error("response carried no signature")]
    MissingSignature,

    /// The returned signature could not be decoded
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

/// Remote signing failed for a specific vault key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to sign with key {key_id} in vault {vault_id}: {cause}")]
pub struct SigningError {
    pub vault_id: String,
    pub key_id: String,
    pub cause: SigningFailure,
}

impl SigningError {
    /// Create a new signing error
    pub fn new(vault_id: impl Into<String>, key_id: impl Into<String>, cause: SigningFailure) -> Self {
        Self {
            vault_id: vault_id.into(),
            key_id: key_id.into(),
            cause,
        }
    }
}

/// The identity service did not accept the invitation
///
/// A token was already signed when this error occurs; `token_id` is the
/// `jti` of that token so it can be revoked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to dispatch invitation to {email}: {message}")]
pub struct DispatchError {
    pub email: String,
    pub message: String,
    pub status: Option<u16>,
    pub transient: bool,
    pub token_id: Option<String>,
}

impl DispatchError {
    /// Create a new dispatch error
    pub fn new(email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            message: message.into(),
            status: None,
            transient: false,
            token_id: None,
        }
    }

    /// Record the HTTP status returned by the identity service
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Mark the failure as transient
    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    /// Attach the `jti` of the undelivered token
    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }
}

/// Errors that abort an invitation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvitationError {
    /// The request is missing a required field
    #[error("Invalid invitation request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Claims or header could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The pipeline did not finish before its deadline
    #[error("Invitation pipeline exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}

impl InvitationError {
    /// Whether the failure stems from a transient transport problem
    pub fn is_transient(&self) -> bool {
        match self {
            InvitationError::Resolution(err) => err.is_transient(),
            InvitationError::Signing(err) => matches!(err.cause, SigningFailure::Unavailable(_)),
            InvitationError::Dispatch(err) => err.transient,
            InvitationError::DeadlineExceeded(_) => true,
            InvitationError::InvalidRequest(_) | InvitationError::Encoding(_) => false,
        }
    }
}

impl From<serde_json::Error> for InvitationError {
    fn from(err: serde_json::Error) -> Self {
        InvitationError::Encoding(err.to_string())
    }
}
