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

//! Cryptographic utilities for artifact signing.
//!
//! This module provides:
//! - Canonical artifact encoding (the exact signing input)
//! - ECDSA P-256 key generation, signing and verification
//! - Key fingerprint computation and PEM/DER key codecs

mod canonical;
mod signing;

pub use canonical::{canonicalize, CanonicalForm, CANONICAL_DOMAIN};
pub use signing::{
    compute_digest, compute_key_fingerprint, decode_private_key_pem, decode_public_key_der,
    decode_public_key_pem, encode_private_key_pem, encode_public_key_pem, encode_verifying_key,
    generate_signing_keypair, normalize_signature, sign_digest, verify_digest_signature,
    CryptoError, GeneratedKeypair, DIGEST_LEN,
};
