//! API request handlers

pub mod invite;

pub use invite::{create_invitation, AppState, CreateInvitationResponse};
