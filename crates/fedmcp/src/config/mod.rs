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

//! Workspace configuration.
//!
//! The library never reads configuration implicitly. Callers (the CLI) load
//! a [`FedmcpConfig`] with [`ConfigLoader`] and pass the values they need into
//! signers, key providers and clients.

pub mod defaults;
pub mod document;
pub mod error;
pub mod loader;
pub mod types;
pub mod validation;

pub use defaults::{default_config_dir, generate_default_config_yaml, DEFAULT_SERVER};
pub use document::ConfigDocument;
pub use error::{ConfigError, ValidationError};
pub use loader::ConfigLoader;
pub use types::*;
pub use validation::Validate;

use std::fs;
use std::path::{Path, PathBuf};

impl FedmcpConfig {
    /// Resolve a workspace by name, falling back to `default_workspace`.
    pub fn workspace(&self, name: Option<&str>) -> Result<&WorkspaceConfig, ConfigError> {
        let name = name
            .or(self.default_workspace.as_deref())
            .ok_or(ConfigError::NoDefaultWorkspace)?;
        self.workspaces
            .get(name)
            .ok_or_else(|| ConfigError::WorkspaceNotFound(name.to_string()))
    }

    /// Server for a workspace, or `default_server` when none is selected.
    pub fn server_for(&self, workspace: Option<&str>) -> Result<&str, ConfigError> {
        match workspace.or(self.default_workspace.as_deref()) {
            Some(name) => Ok(&self.workspace(Some(name))?.server),
            None => Ok(&self.default_server),
        }
    }

    /// Add or replace a workspace.
    pub fn add_workspace(&mut self, workspace: WorkspaceConfig) -> Result<(), ConfigError> {
        workspace.validate()?;
        self.workspaces.insert(workspace.name.clone(), workspace);
        Ok(())
    }

    /// Set a single value by dotted key, as `fedmcp config set` does.
    ///
    /// The configuration is left unchanged when the result would not
    /// validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.clone();
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            reason,
        };

        match key {
            "default_server" => {
                validation::validate_server_url(value)?;
                updated.default_server = value.to_string();
            }
            "default_workspace" => {
                if !updated.workspaces.contains_key(value) {
                    return Err(ConfigError::WorkspaceNotFound(value.to_string()));
                }
                updated.default_workspace = Some(value.to_string());
            }
            "keys_directory" => updated.keys_directory = PathBuf::from(value),
            "trust_store" => updated.trust_store = PathBuf::from(value),
            "kms.endpoint" => {
                validation::validate_server_url(value)?;
                updated
                    .kms
                    .get_or_insert_with(|| KmsConfig {
                        endpoint: String::new(),
                        token_env: None,
                    })
                    .endpoint = value.to_string();
            }
            "client.timeout_secs" => {
                updated.client.timeout_secs =
                    value.parse().map_err(|e| invalid(format!("{}", e)))?;
            }
            "client.retry.max_attempts" => {
                updated.client.retry.max_attempts =
                    value.parse().map_err(|e| invalid(format!("{}", e)))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// The value at a dotted key, as `save` would write it.
    pub fn value_at(&self, key: &str) -> Result<serde_json::Value, ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let tree = serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        key.split('.')
            .try_fold(&tree, |node, part| node.get(part))
            .cloned()
            .ok_or_else(unknown)
    }

    /// Write the configuration to `path`, as TOML for `.toml` files and
    /// YAML otherwise.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(self)?,
            _ => serde_yaml::to_string(self)?,
        };

        let write_err = |source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, content).map_err(write_err)?;
        Ok(())
    }
}
