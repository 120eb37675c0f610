//! Invitation delivery through the identity service

use std::sync::Arc;
use tracing::{info, warn};

use invite_connectors::{IdentityService, ServiceError};
use invite_core::{DispatchError, InvitationPayload};

/// Hands signed invitations to the identity service
pub struct InvitationDispatcher {
    identity: Arc<dyn IdentityService>,
}

impl InvitationDispatcher {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self { identity }
    }

    /// Create the invitation; sent exactly once
    pub async fn dispatch(&self, payload: &InvitationPayload) -> Result<(), DispatchError> {
        match self.identity.create_invitation(payload).await {
            Ok(()) => {
                info!(
                    application_id = %payload.application_id,
                    email = %payload.email,
                    "Invitation dispatched"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    application_id = %payload.application_id,
                    email = %payload.email,
                    error = %err,
                    "Identity service rejected invitation"
                );
                Err(dispatch_error(&payload.email, err))
            }
        }
    }
}

fn dispatch_error(email: &str, err: ServiceError) -> DispatchError {
    let transient = err.is_transient();
    let status = err.status();
    let message = match err {
        ServiceError::Status { message, .. } => message,
        other => other.to_string(),
    };

    let error = DispatchError::new(email, message).transient(transient);
    match status {
        Some(status) => error.with_status(status),
        None => error,
    }
}
