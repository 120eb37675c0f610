//! Remote signer adapter
//!
//! Private keys never leave the vault. The signer hex-encodes the signing
//! input, asks the vault to sign it with the algorithm mapped for the key's
//! spec, and decodes the hex signature it gets back. Requests are sent once.

use std::sync::Arc;
use tracing::{debug, warn};

use invite_connectors::{KeyVaultService, ServiceError, SignOptions};
use invite_core::{
    algorithm_name, Algorithm, AlgorithmTable, SigningError, SigningFailure, SigningInput,
    SigningKey,
};

/// Signs token inputs with vault-held keys
pub struct RemoteSigner {
    vault: Arc<dyn KeyVaultService>,
    algorithms: AlgorithmTable,
}

impl RemoteSigner {
    /// Create a signer using the default algorithm table
    pub fn new(vault: Arc<dyn KeyVaultService>) -> Self {
        Self {
            vault,
            algorithms: AlgorithmTable::default(),
        }
    }

    /// Replace the algorithm table
    pub fn with_algorithms(mut self, algorithms: AlgorithmTable) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// The algorithm tokens signed by `key` are declared with
    pub fn algorithm_for(&self, key: &SigningKey) -> Result<Algorithm, SigningError> {
        self.algorithms.resolve(&key.spec).ok_or_else(|| {
            SigningError::new(
                &key.vault_id,
                &key.id,
                SigningFailure::UnsupportedSpec(key.spec.tag()),
            )
        })
    }

    /// Sign the exact bytes of `input` with `key`
    pub async fn sign(
        &self,
        input: &SigningInput,
        key: &SigningKey,
    ) -> Result<Vec<u8>, SigningError> {
        let algorithm = self.algorithm_for(key)?;
        let options = SignOptions::with_algorithm(algorithm_name(algorithm));
        let fail = |cause| SigningError::new(&key.vault_id, &key.id, cause);

        debug!(
            vault_id = %key.vault_id,
            key_id = %key.id,
            algorithm = %algorithm_name(algorithm),
            "Requesting remote signature"
        );

        let response = self
            .vault
            .sign(&key.vault_id, &key.id, &hex::encode(input.as_bytes()), &options)
            .await
            .map_err(|err| {
                warn!(
                    vault_id = %key.vault_id,
                    key_id = %key.id,
                    error = %err,
                    "Remote signing failed"
                );
                fail(failure_from(err))
            })?;

        let signature = response
            .signature
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| fail(SigningFailure::MissingSignature))?;

        let trimmed = signature.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        hex::decode(digits).map_err(|e| fail(SigningFailure::MalformedSignature(e.to_string())))
    }
}

fn failure_from(err: ServiceError) -> SigningFailure {
    match err {
        ServiceError::NotFound(_) => SigningFailure::KeyNotFound,
        err if err.is_transient() => SigningFailure::Unavailable(err.to_string()),
        err => SigningFailure::Rejected(err.to_string()),
    }
}
