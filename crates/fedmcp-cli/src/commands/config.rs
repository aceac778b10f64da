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

//! Implementation of the `config` commands.

use super::Context;
use anyhow::{bail, Context as _, Result};
use fedmcp::config::{
    default_config_dir, ConfigDocument, ConfigLoader, KeySourceConfig, WorkspaceConfig,
};
use std::path::{Path, PathBuf};

pub fn show(ctx: &Context) -> Result<()> {
    println!("# {}", ctx.config_path.display());
    print!("{}", serde_yaml::to_string(&ctx.config)?);
    Ok(())
}

/// Write a default configuration file.
pub fn init(config_file: Option<&Path>, force: bool) -> Result<()> {
    let path = ConfigLoader::new()
        .resolve_path(config_file)
        .unwrap_or_else(|| default_config_dir().join("config.yaml"));

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = fedmcp::config::FedmcpConfig::default();
    config
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    std::fs::create_dir_all(&config.keys_directory).with_context(|| {
        format!(
            "Failed to create keys directory {}",
            config.keys_directory.display()
        )
    })?;

    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Set one value, editing the configuration file as written.
///
/// The change is validated against the effective configuration, then only
/// that key is written, so `${VAR}` references and values from `FEDMCP_*`
/// overrides elsewhere never end up in the file.
pub fn set(mut ctx: Context, key: &str, value: &str) -> Result<()> {
    ctx.config.set(key, value)?;

    let mut document = ConfigDocument::load(&ctx.config_path)?;
    document.set(key, ctx.config.value_at(key)?)?;
    document.save()?;

    println!("Set {} = {} in {}", key, value, ctx.config_path.display());
    Ok(())
}

pub fn add_workspace(
    mut ctx: Context,
    name: &str,
    server: &str,
    key_file: Option<PathBuf>,
    kms_key_id: Option<String>,
    make_default: bool,
) -> Result<()> {
    let key = match (key_file, kms_key_id) {
        (Some(path), None) => Some(KeySourceConfig::local(path)),
        (None, Some(key_id)) => Some(KeySourceConfig::kms(key_id)),
        (None, None) => None,
        (Some(_), Some(_)) => bail!("Use either --key-file or --kms-key-id, not both"),
    };
    let workspace = WorkspaceConfig {
        name: name.to_string(),
        server: server.to_string(),
        key,
    };

    ctx.config.add_workspace(workspace.clone())?;
    if make_default {
        ctx.config.set("default_workspace", name)?;
    }

    let mut document = ConfigDocument::load(&ctx.config_path)?;
    document.set_path(&["workspaces", name], serde_json::to_value(&workspace)?)?;
    if make_default {
        document.set("default_workspace", serde_json::Value::from(name))?;
    }
    document.save()?;

    println!("Saved workspace '{}' to {}", name, ctx.config_path.display());
    Ok(())
}
