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

//! Implementation of the `keys` commands.

use super::{Context, KeySourceArgs};
use anyhow::{Context as _, Result};
use chrono::Utc;
use fedmcp::crypto::encode_public_key_pem;
use fedmcp::security::{KeyProvider, LocalFileKeyProvider, TrustedKey};
use std::path::Path;

/// Generate a keypair under the configured keys directory.
///
/// Writes `<name>.pem` (private, owner-only) and `<name>.pub.pem`.
pub async fn generate(ctx: &Context, name: &str, trust: bool) -> Result<()> {
    let keys_dir = &ctx.config.keys_directory;
    let private_path = keys_dir.join(format!("{}.pem", name));
    let public_path = keys_dir.join(format!("{}.pub.pem", name));

    let (provider, keypair) = LocalFileKeyProvider::generate(&private_path)?;
    if let Err(e) = std::fs::write(&public_path, &keypair.public_key_pem) {
        // No half-written keypair is left behind.
        let _ = std::fs::remove_file(&private_path);
        return Err(e).with_context(|| format!("Failed to write {}", public_path.display()));
    }

    println!("Generated key {}", provider.key_id());
    println!("  private key: {}", private_path.display());
    println!("  public key:  {}", public_path.display());

    if trust {
        let store_path = ctx.trust_store_path(None);
        let store = ctx.load_trust_store(None)?;
        store.trust(TrustedKey::new(
            provider.key_id(),
            keypair.public_key,
            Utc::now(),
        )?)?;
        store.save_to_file(store_path)?;
        println!("  trusted in:  {}", store_path.display());
    }

    Ok(())
}

/// Print the key id and public key PEM of the selected key source.
///
/// For a KMS key the public key is fetched from the key service; the printed
/// key id is the one its signatures carry.
pub async fn show(ctx: &Context, source: &KeySourceArgs, output: Option<&Path>) -> Result<()> {
    let provider = ctx.key_provider(source)?;
    let public_key = provider
        .public_key()
        .await
        .with_context(|| format!("Failed to get public key for {}", provider.key_id()))?;
    let pem = encode_public_key_pem(&public_key)?;

    println!("Key ID: {}", provider.key_id());
    print!("{}", pem);
    if let Some(output) = output {
        std::fs::write(output, &pem)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Wrote public key to {}", output.display());
    }
    Ok(())
}
