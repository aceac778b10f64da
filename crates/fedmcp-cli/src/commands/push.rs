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

//! Implementation of the `push` command.

use super::Context;
use anyhow::{Context as _, Result};
use fedmcp::SignedArtifact;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run(
    ctx: &Context,
    artifact_file: &Path,
    server: Option<&str>,
    workspace: Option<&str>,
    tags: &[String],
) -> Result<()> {
    let signed = SignedArtifact::read_from_file(artifact_file)
        .with_context(|| format!("Failed to read signed artifact {}", artifact_file.display()))?;
    signed
        .validate()
        .context("Refusing to push a malformed signed artifact")?;

    let client = ctx.server_client(server, workspace)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let receipt = client
        .push_with_cancel(&signed, tags, &cancel)
        .await
        .with_context(|| format!("Failed to push to {}", client.server()))?;

    if receipt.duplicate {
        println!("Artifact {} already present on {}", receipt.artifact_id, client.server());
    } else {
        println!("Pushed artifact {} to {}", receipt.artifact_id, client.server());
    }
    println!("  Received at: {}", receipt.received_at.to_rfc3339());
    if !tags.is_empty() {
        println!("  Tags:        {}", tags.join(", "));
    }
    Ok(())
}
