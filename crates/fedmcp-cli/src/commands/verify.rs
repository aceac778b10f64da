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

//! Implementation of the `verify` command.

use super::Context;
use anyhow::{bail, Context as _, Result};
use fedmcp::security::{Verdict, Verifier};
use fedmcp::SignedArtifact;
use std::path::{Path, PathBuf};

/// Where the signed record comes from.
pub enum Target {
    File(PathBuf),
    Remote {
        artifact_id: String,
        server: Option<String>,
        workspace: Option<String>,
    },
}

/// Verify a record and exit non-zero unless it is verified.
pub async fn run(
    ctx: &Context,
    target: Target,
    trust_store: Option<&Path>,
    json: bool,
) -> Result<()> {
    let signed = match target {
        Target::File(path) => SignedArtifact::read_from_file(&path)
            .with_context(|| format!("Failed to read signed artifact {}", path.display()))?,
        Target::Remote {
            artifact_id,
            server,
            workspace,
        } => {
            let client = ctx.server_client(server.as_deref(), workspace.as_deref())?;
            client
                .fetch(&artifact_id)
                .await
                .with_context(|| format!("Failed to fetch {} from {}", artifact_id, client.server()))?
        }
    };

    let store = ctx.load_trust_store(trust_store)?;
    let verdict = Verifier::new(&store).verify_now(&signed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&verdict);
    }

    if let Some(reason) = verdict.failure_reason() {
        bail!("Verification failed: {}", reason);
    }
    Ok(())
}

fn print_verdict(verdict: &Verdict) {
    if verdict.is_verified() {
        println!("✓ Artifact {} verified", verdict.artifact_id);
    } else {
        println!("✗ Artifact {} failed verification", verdict.artifact_id);
    }
    println!("  Key ID:    {}", verdict.key_id);
    println!("  Signed at: {}", verdict.signed_at.to_rfc3339());
    if let Some(expires_at) = verdict.expires_at {
        println!("  Expires:   {}", expires_at.to_rfc3339());
    }
    if let Some(reason) = verdict.failure_reason() {
        println!("  Reason:    {}", reason);
    }
}
