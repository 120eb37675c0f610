//! Vault-backed signing

mod signer;

pub use signer::RemoteSigner;
