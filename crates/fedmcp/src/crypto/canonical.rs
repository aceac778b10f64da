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

//! Canonical byte encoding of artifacts.
//!
//! The canonical form is the exact input to signing and verification, so the
//! layout below is a wire contract shared by every implementation:
//!
//! ```text
//! lp("fedmcp-artifact-v1")
//! lp(type tag) lp(name) lp(content)
//! i64_be(created_at unix seconds) u32_be(created_at subsecond nanos)
//! u64_be(metadata entry count)
//! { lp(key) lp(value) }*      -- sorted by key, byte-wise
//!
//! lp(x) = u64_be(len(x)) || x
//! ```
//!
//! The artifact `id` is not part of the canonical form.

use super::signing::{compute_digest, DIGEST_LEN};
use crate::artifact::Artifact;

/// Domain separation prefix for canonical artifacts.
pub const CANONICAL_DOMAIN: &[u8] = b"fedmcp-artifact-v1";

/// Deterministic byte encoding of an artifact's logical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm(Vec<u8>);

impl CanonicalForm {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// SHA-256 digest of the canonical bytes; this is what gets signed.
    pub fn digest(&self) -> [u8; DIGEST_LEN] {
        compute_digest(&self.0)
    }
}

/// Canonicalize an artifact. Pure and total.
pub fn canonicalize(artifact: &Artifact) -> CanonicalForm {
    let mut out = Vec::with_capacity(
        CANONICAL_DOMAIN.len() + artifact.name().len() + artifact.content().len() + 128,
    );

    put_field(&mut out, CANONICAL_DOMAIN);
    put_field(&mut out, artifact.artifact_type().as_str().as_bytes());
    put_field(&mut out, artifact.name().as_bytes());
    put_field(&mut out, artifact.content());

    let created_at = artifact.created_at();
    out.extend_from_slice(&created_at.timestamp().to_be_bytes());
    out.extend_from_slice(&created_at.timestamp_subsec_nanos().to_be_bytes());

    // BTreeMap iterates in byte-wise key order.
    let metadata = artifact.metadata();
    out.extend_from_slice(&(metadata.len() as u64).to_be_bytes());
    for (key, value) in metadata {
        put_field(&mut out, key.as_bytes());
        put_field(&mut out, value.as_bytes());
    }

    CanonicalForm(out)
}

fn put_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
}
