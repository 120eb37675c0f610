//! Compact token assembly
//!
//! A token is `<b64url(header)>.<b64url(claims)>.<b64url(signature)>` with
//! padding stripped. The signature covers exactly the bytes of the first two
//! segments joined by `.`; this module never signs, it only prepares the
//! signing input and appends whatever signature the remote signer returns.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, Header};
use serde::Serialize;
use std::fmt;

use crate::error::{InvitationError, Result};

/// Separator between token segments
pub const SEGMENT_SEPARATOR: char = '.';

/// Build the JOSE header for a token signed by a vault key
pub fn token_header(algorithm: Algorithm, key_id: impl Into<String>) -> Header {
    let mut header = Header::new(algorithm);
    header.kid = Some(key_id.into());
    header
}

/// The first two segments of a token, ready to be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningInput(String);

impl SigningInput {
    /// Encode header and claims into `<header>.<claims>`
    pub fn new<C: Serialize>(header: &Header, claims: &C) -> Result<Self> {
        let header_json = serde_json::to_vec(header)?;
        let claims_json = serde_json::to_vec(claims)?;
        Ok(Self(format!(
            "{}{}{}",
            URL_SAFE_NO_PAD.encode(header_json),
            SEGMENT_SEPARATOR,
            URL_SAFE_NO_PAD.encode(claims_json),
        )))
    }

    /// The signing input as text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The exact bytes the signature must cover
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Append a signature to the signing input
pub fn assemble(signing_input: &SigningInput, signature: &[u8]) -> CompactToken {
    CompactToken(format!(
        "{}{}{}",
        signing_input.as_str(),
        SEGMENT_SEPARATOR,
        URL_SAFE_NO_PAD.encode(signature),
    ))
}

/// A signed compact token
///
/// `Debug` is redacted so the bearer token cannot end up in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct CompactToken(String);

impl fmt::Debug for CompactToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompactToken").field(&"[redacted]").finish()
    }
}

impl CompactToken {
    /// Wrap an existing token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the token text
    pub fn into_string(self) -> String {
        self.0
    }

    /// Split and decode the token without verifying its signature
    pub fn decode(&self) -> Result<DecodedToken> {
        let segments: Vec<&str> = self.0.split(SEGMENT_SEPARATOR).collect();
        if segments.len() != 3 {
            return Err(InvitationError::Encoding(format!(
                "expected 3 token segments, found {}",
                segments.len()
            )));
        }

        let header_bytes = decode_segment(segments[0], "header")?;
        let claims_bytes = decode_segment(segments[1], "claims")?;
        let signature = decode_segment(segments[2], "signature")?;

        Ok(DecodedToken {
            header: serde_json::from_slice(&header_bytes)?,
            claims: serde_json::from_slice(&claims_bytes)?,
            signing_input: format!("{}{}{}", segments[0], SEGMENT_SEPARATOR, segments[1]),
            signature,
        })
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| InvitationError::Encoding(format!("invalid {} segment: {}", name, e)))
}

/// An unverified, decoded token
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: serde_json::Value,
    pub signing_input: String,
    pub signature: Vec<u8>,
}
