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

//! Implementation of the `trust` commands.

use super::Context;
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use fedmcp::crypto::decode_public_key_pem;
use fedmcp::security::TrustedKey;
use std::path::Path;

/// Trust the public key in `public_key_file`, optionally until a given
/// RFC 3339 instant.
///
/// The key is filed under `key_id` when given (a KMS key is looked up by the
/// id its envelopes carry), otherwise under its fingerprint.
pub fn add(
    ctx: &Context,
    public_key_file: &Path,
    key_id: Option<&str>,
    until: Option<&str>,
) -> Result<()> {
    let pem = std::fs::read_to_string(public_key_file)
        .with_context(|| format!("Failed to read {}", public_key_file.display()))?;

    let mut key = match key_id {
        Some(key_id) => {
            let public_key = decode_public_key_pem(&pem).with_context(|| {
                format!("{} is not a PEM public key", public_key_file.display())
            })?;
            TrustedKey::new(key_id, public_key, Utc::now())?
        }
        None => TrustedKey::from_public_key_pem(&pem, Utc::now())?,
    };
    if let Some(until) = until {
        key = key.with_trusted_until(parse_until(until)?);
    }
    let key_id = key.key_id.clone();

    let store = ctx.load_trust_store(None)?;
    store.trust(key)?;
    store.save_to_file(ctx.trust_store_path(None))?;

    println!("Trusted {}", key_id);
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let store = ctx.load_trust_store(None)?;
    if store.is_empty() {
        println!("No trusted keys in {}", ctx.trust_store_path(None).display());
        return Ok(());
    }

    println!("{:<64}  {:<25}  {:<25}  STATUS", "KEY ID", "FROM", "UNTIL");
    let now = Utc::now();
    for key in store.list() {
        let status = if key.revoked {
            "revoked"
        } else if key.is_trusted_at(now) {
            "trusted"
        } else {
            "inactive"
        };
        println!(
            "{:<64}  {:<25}  {:<25}  {}",
            key.key_id,
            key.trusted_from.to_rfc3339(),
            key.trusted_until
                .map(|until| until.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            status
        );
    }
    Ok(())
}

pub fn revoke(ctx: &Context, key_id: &str) -> Result<()> {
    let store = ctx.load_trust_store(None)?;
    store.revoke(key_id)?;
    store.save_to_file(ctx.trust_store_path(None))?;
    println!("Revoked {}", key_id);
    Ok(())
}

fn parse_until(until: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(until)
        .with_context(|| format!("Invalid --until '{}', expected RFC 3339", until))?;
    Ok(parsed.with_timezone(&Utc))
}
