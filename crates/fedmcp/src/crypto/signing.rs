/*
 *  Copyright 2025-2026 FedMCP Contributors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! ECDSA P-256 signing utilities for artifact signatures.
//!
//! Provides functions for:
//! - Generating P-256 signing keypairs
//! - Computing SHA256 key fingerprints
//! - Signing and verifying SHA-256 digests (prehashed ECDSA)
//! - PEM/DER encoding of private and public keys

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// PEM tag for PKCS#8 private keys.
pub const PKCS8_PRIVATE_KEY_TAG: &str = "PRIVATE KEY";

/// PEM tag for SEC1 EC private keys.
pub const SEC1_PRIVATE_KEY_TAG: &str = "EC PRIVATE KEY";

/// PEM tag for SubjectPublicKeyInfo public keys.
pub const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Errors that can occur during low-level cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid digest: expected {DIGEST_LEN} bytes, got {0}")]
    InvalidDigestLength(usize),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid PEM: {0}")]
    InvalidPem(String),

    #[error("Malformed signature encoding: {0}")]
    MalformedSignature(String),

    #[error("Failed to create signature: {0}")]
    SignatureFailed(String),

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// A generated P-256 keypair.
pub struct GeneratedKeypair {
    /// PKCS#8 PEM private key (write with restrictive permissions)
    pub private_key_pem: String,
    /// SEC1 uncompressed public point (65 bytes)
    pub public_key: Vec<u8>,
    /// SubjectPublicKeyInfo PEM public key
    pub public_key_pem: String,
    /// SHA256 hex fingerprint of the public key
    pub fingerprint: String,
}

/// Generates a new ECDSA P-256 signing keypair.
pub fn generate_signing_keypair() -> Result<GeneratedKeypair, CryptoError> {
    let signing_key = SigningKey::random(&mut rand::thread_rng());
    let public_key = encode_verifying_key(signing_key.verifying_key());

    Ok(GeneratedKeypair {
        private_key_pem: encode_private_key_pem(&signing_key)?,
        public_key_pem: encode_public_key_pem(&public_key)?,
        fingerprint: compute_key_fingerprint(&public_key),
        public_key,
    })
}

/// Computes the SHA256 hex fingerprint of a SEC1-encoded public key.
pub fn compute_key_fingerprint(public_key: &[u8]) -> String {
    hex::encode(compute_digest(public_key))
}

/// Computes the SHA-256 digest of arbitrary data.
pub fn compute_digest(data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Returns the SEC1 uncompressed encoding of a verifying key.
pub fn encode_verifying_key(key: &VerifyingKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

/// Signs a SHA-256 digest, returning an ASN.1 DER encoded signature.
///
/// The digest is signed as-is (prehashed); it is not hashed again.
pub fn sign_digest(digest: &[u8], signing_key: &SigningKey) -> Result<Vec<u8>, CryptoError> {
    if digest.len() != DIGEST_LEN {
        return Err(CryptoError::InvalidDigestLength(digest.len()));
    }

    let signature: Signature = signing_key
        .sign_prehash(digest)
        .map_err(|e| CryptoError::SignatureFailed(e.to_string()))?;

    Ok(signature.to_der().as_bytes().to_vec())
}

/// Verifies a signature over a SHA-256 digest using a SEC1-encoded public key.
///
/// Accepts either DER or fixed-width (r || s) signature encodings.
pub fn verify_digest_signature(
    digest: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), CryptoError> {
    if digest.len() != DIGEST_LEN {
        return Err(CryptoError::InvalidDigestLength(digest.len()));
    }

    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let signature = parse_signature(signature)?;

    verifying_key
        .verify_prehash(digest, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Normalises a DER or fixed-width signature to low-S DER form.
pub fn normalize_signature(signature: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let parsed = parse_signature(signature)?;
    let parsed = parsed.normalize_s().unwrap_or(parsed);
    Ok(parsed.to_der().as_bytes().to_vec())
}

fn parse_signature(signature: &[u8]) -> Result<Signature, CryptoError> {
    if signature.len() == 64 {
        return Signature::from_slice(signature)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()));
    }
    Signature::from_der(signature).map_err(|e| CryptoError::MalformedSignature(e.to_string()))
}

/// Parses a PEM private key (PKCS#8 or SEC1) into a signing key.
pub fn decode_private_key_pem(pem_str: &str) -> Result<SigningKey, CryptoError> {
    let pem = pem::parse(pem_str).map_err(|e| CryptoError::InvalidPem(e.to_string()))?;

    match pem.tag() {
        PKCS8_PRIVATE_KEY_TAG => SigningKey::from_pkcs8_der(pem.contents())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string())),
        SEC1_PRIVATE_KEY_TAG => p256::SecretKey::from_sec1_der(pem.contents())
            .map(SigningKey::from)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string())),
        other => Err(CryptoError::InvalidPem(format!(
            "expected '{}' or '{}', got '{}'",
            PKCS8_PRIVATE_KEY_TAG, SEC1_PRIVATE_KEY_TAG, other
        ))),
    }
}

/// Encodes a signing key as a PKCS#8 PEM document.
pub fn encode_private_key_pem(signing_key: &SigningKey) -> Result<String, CryptoError> {
    let der = signing_key
        .to_pkcs8_der()
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    let pem = pem::Pem::new(PKCS8_PRIVATE_KEY_TAG, der.as_bytes().to_vec());
    Ok(pem::encode(&pem))
}

/// Encodes a SEC1 public key as a SubjectPublicKeyInfo PEM document.
pub fn encode_public_key_pem(public_key: &[u8]) -> Result<String, CryptoError> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let der = verifying_key
        .to_public_key_der()
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let pem = pem::Pem::new(PUBLIC_KEY_TAG, der.as_bytes().to_vec());
    Ok(pem::encode(&pem))
}

/// Decodes a SubjectPublicKeyInfo PEM document to SEC1 public key bytes.
pub fn decode_public_key_pem(pem_str: &str) -> Result<Vec<u8>, CryptoError> {
    let pem = pem::parse(pem_str).map_err(|e| CryptoError::InvalidPem(e.to_string()))?;

    if pem.tag() != PUBLIC_KEY_TAG {
        return Err(CryptoError::InvalidPem(format!(
            "expected '{}', got '{}'",
            PUBLIC_KEY_TAG,
            pem.tag()
        )));
    }

    decode_public_key_der(pem.contents())
}

/// Decodes a SubjectPublicKeyInfo DER document to SEC1 public key bytes.
pub fn decode_public_key_der(der: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let verifying_key = VerifyingKey::from_public_key_der(der)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    Ok(encode_verifying_key(&verifying_key))
}
