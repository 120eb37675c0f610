//! Service Connectors
//!
//! Clients for the external systems the invitation pipeline talks to:
//!
//! - **Key vault**: lists vaults and keys, signs on the organization's behalf
//! - **Registry**: lists the workgroup's registry contracts
//! - **Identity**: resolves organizations and delivers invitations
//!
//! Each system is a trait in [`services`] with an HTTP implementation in
//! [`http`] and an in-memory implementation in [`memory`].

pub mod error;
pub mod http;
pub mod memory;
pub mod services;

pub use error::{Result, ServiceError};
pub use http::{ApiClient, HttpIdentity, HttpKeyVault, HttpRegistry, RetryPolicy};
pub use memory::{InMemoryIdentity, InMemoryKeyVault, InMemoryRegistry};
pub use services::{IdentityService, KeyVaultService, RegistryService, SignOptions, SignResponse};
