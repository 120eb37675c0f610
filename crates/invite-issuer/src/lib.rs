//! Invitation Issuer
//!
//! Issues signed invitation tokens that let an organization bring a new
//! participant into a workgroup:
//!
//! 1. Resolve the inviting organization's vault keys, registry contract and
//!    messaging endpoint
//! 2. Build the invitation claims
//! 3. Have the organization's vault sign them
//! 4. Assemble the compact token
//! 5. Deliver the invitation through the identity service
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check
//! - `POST /v1/invitations` - Issue and deliver an invitation

pub mod api;
pub mod config;
pub mod keys;
pub mod pipeline;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::{ConfigError, IssuerConfig};
pub use keys::RemoteSigner;
pub use pipeline::{
    ContextResolver, InvitationDispatcher, InvitationIssuer, IssuedInvitation, PipelineStage,
};
