//! Mapping from key spec families to JWS signing algorithms
//!
//! The remote signer and the token header both look up the algorithm here,
//! so supporting a new key family means registering it on the table rather
//! than touching either call site.

use jsonwebtoken::Algorithm;
use std::collections::HashMap;

use crate::types::{KeyFamily, KeySpec};

/// Table of key family → JWS algorithm
#[derive(Debug, Clone)]
pub struct AlgorithmTable {
    mappings: HashMap<KeyFamily, Algorithm>,
}

impl AlgorithmTable {
    /// An empty table with no mappings
    pub fn empty() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Register (or replace) the algorithm for a key family
    pub fn with_mapping(mut self, family: KeyFamily, algorithm: Algorithm) -> Self {
        self.mappings.insert(family, algorithm);
        self
    }

    /// Resolve the algorithm for a key spec
    pub fn resolve(&self, spec: &KeySpec) -> Option<Algorithm> {
        self.mappings.get(&spec.family()).copied()
    }

    /// Whether a key of this spec can sign tokens
    pub fn supports(&self, spec: &KeySpec) -> bool {
        self.resolve(spec).is_some()
    }
}

impl Default for AlgorithmTable {
    /// RSA → RS256, P-256 → ES256, Ed25519 → EdDSA.
    ///
    /// secp256k1 has no JWS algorithm supported here; those keys only
    /// provide the invitor's on-chain address.
    fn default() -> Self {
        Self::empty()
            .with_mapping(KeyFamily::Rsa, Algorithm::RS256)
            .with_mapping(KeyFamily::P256, Algorithm::ES256)
            .with_mapping(KeyFamily::Ed25519, Algorithm::EdDSA)
    }
}

/// The JWS `alg` name of an algorithm
pub fn algorithm_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::HS256 => "HS256",
        Algorithm::HS384 => "HS384",
        Algorithm::HS512 => "HS512",
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        Algorithm::EdDSA => "EdDSA",
    }
}
