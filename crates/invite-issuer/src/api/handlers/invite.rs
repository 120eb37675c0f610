//! Invitation Handler
//!
//! Runs the issuance pipeline for one invitee and returns the signed token
//! once the identity service has accepted the invitation.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use invite_core::InvitationRequest;

use crate::api::error::ApiError;
use crate::pipeline::InvitationIssuer;

/// Application state shared across handlers
pub struct AppState {
    pub issuer: InvitationIssuer,
}

/// Response to a delivered invitation
#[derive(Debug, Serialize)]
pub struct CreateInvitationResponse {
    pub email: String,
    pub workgroup_id: String,
    /// Id of the signed token, for revocation
    pub jti: String,
    /// The signed invitation token
    pub token: String,
}

/// Invite a participant into a workgroup
///
/// POST /v1/invitations
///
/// Bodies that are not a well-formed request are answered with the same
/// JSON error shape as every other failure.
pub async fn create_invitation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InvitationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateInvitationResponse>), ApiError> {
    let Json(request) = payload?;
    info!(
        organization_id = %request.organization_id,
        workgroup_id = %request.workgroup_id,
        managed_tenant = request.managed_tenant,
        "Invitation requested"
    );

    let issued = state.issuer.invite(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInvitationResponse {
            email: issued.email,
            workgroup_id: issued.workgroup_id,
            jti: issued.jti,
            token: issued.token.into_string(),
        }),
    ))
}
