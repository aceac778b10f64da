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

//! # FedMCP
//!
//! Integrity layer for FedMCP compliance artifacts: SSP fragments, POA&M
//! templates, agent recipes, baseline modules and audit scripts.
//!
//! ## Key Features
//!
//! - Deterministic canonical encoding of artifacts ([`crypto::canonicalize`])
//! - ECDSA P-256 signing through interchangeable [`security::KeyProvider`]s
//!   (local PEM file or remote KMS)
//! - Verification against an operator-managed [`security::TrustStore`],
//!   reported as a structured [`security::Verdict`]
//! - Push and fetch of signed records with bounded retry ([`client::ServerClient`])
//! - Workspace configuration loading ([`config::ConfigLoader`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use fedmcp::artifact::{Artifact, ArtifactType};
//! use fedmcp::security::{LocalFileKeyProvider, Signer, TrustStore, TrustedKey, Verifier, KeyProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = LocalFileKeyProvider::load("/home/me/.fedmcp/keys/prod.pem")?;
//! let artifact = Artifact::new(
//!     ArtifactType::SspFragment,
//!     "ML Pipeline Security",
//!     b"controls: [AC-2]".to_vec(),
//! );
//!
//! let signed = Signer::default().sign(&artifact, &provider).await?;
//!
//! let store = TrustStore::new();
//! store.trust(TrustedKey::new(
//!     provider.key_id(),
//!     provider.public_key().await?,
//!     chrono::Utc::now(),
//! )?)?;
//!
//! let verdict = Verifier::new(&store).verify_now(&signed)?;
//! assert!(verdict.is_verified());
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod client;
pub mod config;
pub mod crypto;
pub mod retry;
pub mod security;

pub use artifact::{Artifact, ArtifactError, ArtifactType, SignatureEnvelope, SignedArtifact};
pub use client::{ClientError, ServerClient, ServerReceipt};
pub use retry::{BackoffStrategy, RetryPolicy};
