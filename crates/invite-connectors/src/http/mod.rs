//! HTTP implementations of the service contracts

pub mod client;
pub mod ident;
pub mod registry;
pub mod vault;

pub use client::{ApiClient, RetryPolicy};
pub use ident::HttpIdentity;
pub use registry::HttpRegistry;
pub use vault::HttpKeyVault;
