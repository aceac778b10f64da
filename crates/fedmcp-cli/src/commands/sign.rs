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

//! Implementation of the `sign` command.
//!
//! Signs an unsigned artifact record, or re-signs a signed one (keeping the
//! previous envelopes as history).

use super::{Context, KeySourceArgs};
use anyhow::{anyhow, Context as _, Result};
use chrono::Duration;
use fedmcp::artifact::{Artifact, SignedArtifact};
use fedmcp::security::{Signer, SigningPolicy};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Parse a duration string like "90d", "24h", "7d12h" into a chrono::Duration.
///
/// Supported units:
/// - `d` - days
/// - `h` - hours
/// - `m` - minutes
/// - `s` - seconds
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return Err(anyhow!("Duration string cannot be empty"));
    }

    let mut total = Duration::zero();
    let mut current_num = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            current_num.push(c);
            continue;
        }
        if current_num.is_empty() {
            return Err(anyhow!(
                "Invalid duration format: expected number before '{}'",
                c
            ));
        }

        let num: i64 = current_num
            .parse()
            .with_context(|| format!("Invalid number in duration: {}", current_num))?;
        current_num.clear();

        total = total
            + match c {
                'd' => Duration::days(num),
                'h' => Duration::hours(num),
                'm' => Duration::minutes(num),
                's' => Duration::seconds(num),
                _ => return Err(anyhow!("Unknown duration unit: '{}'. Use d, h, m, or s", c)),
            };
    }

    if !current_num.is_empty() {
        return Err(anyhow!(
            "Duration '{}' is missing a unit. Use d (days), h (hours), m (minutes), or s (seconds)",
            s
        ));
    }
    if total <= Duration::zero() {
        return Err(anyhow!("Duration must be greater than zero"));
    }

    Ok(total)
}

/// Either an unsigned artifact or an existing signed record.
enum Input {
    Unsigned(Artifact),
    Signed(SignedArtifact),
}

fn read_input(path: &Path) -> Result<Input> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Ok(signed) = SignedArtifact::from_json(&json) {
        return Ok(Input::Signed(signed));
    }
    let artifact: Artifact = serde_json::from_str(&json)
        .with_context(|| format!("{} is not an artifact record", path.display()))?;
    Ok(Input::Unsigned(artifact))
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    input.with_file_name(format!("{}.signed.json", stem))
}

pub async fn run(
    ctx: &Context,
    artifact_file: &Path,
    source: &KeySourceArgs,
    valid_for: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let policy = match valid_for {
        Some(window) => SigningPolicy::with_validity(
            parse_duration(window).with_context(|| format!("Invalid duration: '{}'", window))?,
        ),
        None => SigningPolicy::default(),
    };
    let signer = Signer::new(policy);
    let provider = ctx.key_provider(source)?;

    // Ctrl-C cancels an in-flight KMS call without writing anything.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let (signed, output) = match read_input(artifact_file)? {
        Input::Unsigned(artifact) => {
            let signed = signer
                .sign_with_cancel(&artifact, provider.as_ref(), &cancel)
                .await?;
            let output = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| default_output(artifact_file));
            (signed, output)
        }
        Input::Signed(existing) => {
            let signed = signer
                .resign_with_cancel(&existing, provider.as_ref(), &cancel)
                .await?;
            let output = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| artifact_file.to_path_buf());
            (signed, output)
        }
    };

    signed
        .write_to_file(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let envelope = signed.active_envelope()?;
    info!(artifact_id = signed.id(), key_id = %envelope.key_id, "Signed artifact");
    println!("Signed artifact {}", signed.id());
    println!("  Key ID:    {}", envelope.key_id);
    println!("  Signed at: {}", envelope.signed_at.to_rfc3339());
    match envelope.expires_at {
        Some(expires_at) => println!("  Expires:   {}", expires_at.to_rfc3339()),
        None => println!("  Expires:   never"),
    }
    println!("  Output:    {}", output.display());
    Ok(())
}
