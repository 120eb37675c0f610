//! # Invite Core
//!
//! Data model and pure building blocks for issuing workgroup invitation
//! tokens.
//!
//! ## Key Concepts
//!
//! - **Organization context**: the inviting organization's signing key,
//!   on-chain address, registry contract and messaging endpoint
//! - **Invitation claims**: standard JWT claims plus the nested `baseline`
//!   workgroup parameters and optional `accessScope` permissions
//! - **Compact token**: `header.claims.signature`, each segment unpadded
//!   base64url
//!
//! Nothing in this crate performs I/O or holds private key material. The
//! signature itself is produced by a remote vault; see `invite-issuer`.

pub mod algorithm;
pub mod claims;
pub mod error;
pub mod scope;
pub mod select;
pub mod token;
pub mod types;

pub use algorithm::{algorithm_name, AlgorithmTable};
pub use claims::{BaselineParams, ClaimsBuilder, InvitationClaims};
pub use error::{
    DispatchError, InvitationError, ResolutionError, Result, SigningError, SigningFailure,
};
pub use scope::{AccessScopeClaims, AccessScopePolicy};
pub use select::{Listed, SelectionPolicy};
pub use token::{assemble, token_header, CompactToken, DecodedToken, SigningInput};
pub use types::{
    InvitationParams, InvitationPayload, InvitationRequest, KeyFamily, KeySpec,
    OrganizationContext, OrganizationDetails, RegistryContract, SigningKey, Vault,
};

/// Re-exported so callers can name algorithms without depending on jsonwebtoken
pub use jsonwebtoken::Algorithm;
