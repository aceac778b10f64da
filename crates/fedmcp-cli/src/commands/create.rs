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

//! Implementation of the `create` command.

use anyhow::{anyhow, Context, Result};
use fedmcp::artifact::{Artifact, ArtifactType};
use std::path::{Path, PathBuf};
use tracing::info;

/// Parse `KEY=VALUE` metadata arguments.
fn parse_metadata(entries: &[String]) -> Result<Vec<(String, String)>> {
    entries
        .iter()
        .map(|entry| {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("Metadata '{}' must be KEY=VALUE", entry))?;
            if key.is_empty() {
                return Err(anyhow!("Metadata '{}' has an empty key", entry));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Build an artifact from a content file and write its record.
pub fn run(
    artifact_type: &str,
    name: &str,
    file: &Path,
    metadata: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let artifact_type: ArtifactType = artifact_type.parse()?;
    let content =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let mut artifact = Artifact::new(artifact_type, name, content);
    for (key, value) in parse_metadata(metadata)? {
        artifact = artifact.with_metadata(key, value);
    }
    artifact.validate()?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.json", artifact.id())));
    let json = serde_json::to_string_pretty(&artifact)?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(artifact_id = artifact.id(), artifact_type = %artifact_type, "Created artifact");
    println!("Created {} artifact {}", artifact_type, artifact.id());
    println!("  Name:   {}", artifact.name());
    println!("  Output: {}", output.display());
    Ok(())
}
