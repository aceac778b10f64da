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

//! Compliance artifacts and their signature envelopes.
//!
//! This module provides:
//! - [`Artifact`], the immutable logical document that gets signed
//! - [`SignatureEnvelope`], a detached annex describing one signature
//! - [`SignedArtifact`], the persisted record pairing an artifact with its
//!   envelope history and exactly one active envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building, validating or persisting artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Malformed artifact: {0}")]
    Malformed(String),

    #[error("Unknown artifact type: {0}")]
    UnknownType(String),

    #[error("Failed to read or write artifact file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact record: {0}")]
    Json(#[from] serde_json::Error),
}

/// The kind of compliance document an artifact carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    /// System Security Plan fragment
    SspFragment,
    /// Plan of Action & Milestones template
    PoamTemplate,
    /// Agent configuration recipe
    AgentRecipe,
    /// Security baseline module
    BaselineModule,
    /// Audit automation script
    AuditScript,
}

impl ArtifactType {
    /// Every supported artifact type, in declaration order.
    pub const ALL: [ArtifactType; 5] = [
        ArtifactType::SspFragment,
        ArtifactType::PoamTemplate,
        ArtifactType::AgentRecipe,
        ArtifactType::BaselineModule,
        ArtifactType::AuditScript,
    ];

    /// The stable wire tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::SspFragment => "ssp-fragment",
            ArtifactType::PoamTemplate => "poam-template",
            ArtifactType::AgentRecipe => "agent-recipe",
            ArtifactType::BaselineModule => "baseline-module",
            ArtifactType::AuditScript => "audit-script",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ArtifactError::UnknownType(s.to_string()))
    }
}

/// A compliance artifact.
///
/// Fields are private: once constructed an artifact cannot be edited in
/// place. [`Artifact::revise`] produces a new artifact with a new `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    id: String,
    #[serde(rename = "type")]
    artifact_type: ArtifactType,
    name: String,
    #[serde(with = "base64_bytes")]
    content: Vec<u8>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl Artifact {
    /// Create a new artifact with a fresh id and creation timestamp.
    pub fn new(artifact_type: ArtifactType, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            artifact_type,
            name: name.into(),
            content,
            created_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Rebuild an artifact from known field values (e.g. received from
    /// another implementation).
    pub fn from_parts(
        id: impl Into<String>,
        artifact_type: ArtifactType,
        name: impl Into<String>,
        content: Vec<u8>,
        created_at: DateTime<Utc>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            artifact_type,
            name: name.into(),
            content,
            created_at,
            metadata,
        }
    }

    /// Add a metadata entry while building the artifact.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Produce an edited copy with new content, a new id and a new timestamp.
    pub fn revise(&self, content: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            artifact_type: self.artifact_type,
            name: self.name.clone(),
            content,
            created_at: Utc::now(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Check structural well-formedness.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.id.trim().is_empty() {
            return Err(ArtifactError::Malformed("artifact id is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ArtifactError::Malformed("artifact name is empty".to_string()));
        }
        if self.metadata.keys().any(|k| k.is_empty()) {
            return Err(ArtifactError::Malformed(
                "metadata contains an empty key".to_string(),
            ));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn content_mut(&mut self) -> &mut Vec<u8> {
        &mut self.content
    }
}

/// A single signature over an artifact's canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Signature algorithm (currently "ECDSA_P256_SHA256")
    pub algorithm: String,
    /// Fingerprint or KMS identifier of the signing key
    pub key_id: String,
    /// DER encoded ECDSA signature over the SHA-256 digest of the canonical form
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    /// When the signature was created
    pub signed_at: DateTime<Utc>,
    /// When the signature stops being acceptable (absent means never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SignatureEnvelope {
    /// Algorithm identifier for ECDSA P-256 with SHA-256.
    pub const ALGORITHM: &'static str = "ECDSA_P256_SHA256";
}

/// Envelope as persisted, tagged with whether it is the active one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeRecord {
    #[serde(flatten)]
    pub envelope: SignatureEnvelope,
    pub active: bool,
}

/// An artifact together with its signature envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedArtifact {
    version: u32,
    artifact: Artifact,
    signatures: Vec<EnvelopeRecord>,
}

impl SignedArtifact {
    /// Current record format version.
    pub const VERSION: u32 = 1;

    /// Attach a first envelope to an artifact.
    pub fn new(artifact: Artifact, envelope: SignatureEnvelope) -> Self {
        Self {
            version: Self::VERSION,
            artifact,
            signatures: vec![EnvelopeRecord {
                envelope,
                active: true,
            }],
        }
    }

    /// Replace the active envelope, keeping the previous ones as history.
    ///
    /// The artifact itself is carried over untouched.
    pub fn with_envelope(mut self, envelope: SignatureEnvelope) -> Self {
        for record in &mut self.signatures {
            record.active = false;
        }
        self.signatures.push(EnvelopeRecord {
            envelope,
            active: true,
        });
        self
    }

    pub fn id(&self) -> &str {
        self.artifact.id()
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// All envelopes, oldest first.
    pub fn envelopes(&self) -> &[EnvelopeRecord] {
        &self.signatures
    }

    /// Superseded envelopes, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SignatureEnvelope> {
        self.signatures
            .iter()
            .filter(|r| !r.active)
            .map(|r| &r.envelope)
    }

    /// The envelope verification targets.
    pub fn active_envelope(&self) -> Result<&SignatureEnvelope, ArtifactError> {
        let mut active = self.signatures.iter().filter(|r| r.active);
        match (active.next(), active.next()) {
            (Some(record), None) => Ok(&record.envelope),
            (None, _) => Err(ArtifactError::Malformed(
                "no active signature envelope".to_string(),
            )),
            (Some(_), Some(_)) => Err(ArtifactError::Malformed(
                "more than one active signature envelope".to_string(),
            )),
        }
    }

    /// Check the record shape: supported version, well-formed artifact and
    /// exactly one well-formed active envelope.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.version != Self::VERSION {
            return Err(ArtifactError::Malformed(format!(
                "unsupported record version {}",
                self.version
            )));
        }
        self.artifact.validate()?;

        let envelope = self.active_envelope()?;
        if envelope.algorithm != SignatureEnvelope::ALGORITHM {
            return Err(ArtifactError::Malformed(format!(
                "unsupported signature algorithm '{}'",
                envelope.algorithm
            )));
        }
        if envelope.key_id.trim().is_empty() {
            return Err(ArtifactError::Malformed("envelope key_id is empty".to_string()));
        }
        if envelope.signature.is_empty() {
            return Err(ArtifactError::Malformed(
                "envelope signature is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a signed artifact record from JSON.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the record to a file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ArtifactError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a record from a file.
    pub fn read_from_file(path: &Path) -> Result<Self, ArtifactError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[cfg(test)]
    pub(crate) fn artifact_mut(&mut self) -> &mut Artifact {
        &mut self.artifact
    }

    #[cfg(test)]
    pub(crate) fn active_envelope_mut(&mut self) -> &mut SignatureEnvelope {
        let record = self
            .signatures
            .iter_mut()
            .rev()
            .find(|r| r.active)
            .expect("record has an active envelope");
        &mut record.envelope
    }
}

/// Serde adapter storing byte vectors as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
