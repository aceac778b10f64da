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

use crate::config::defaults::default_config_dir;
use crate::config::validation::Validate;
use crate::config::{ConfigError, FedmcpConfig};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "FEDMCP_CONFIG";
pub const DEFAULT_SERVER_ENV: &str = "FEDMCP_DEFAULT_SERVER";
pub const DEFAULT_WORKSPACE_ENV: &str = "FEDMCP_DEFAULT_WORKSPACE";
pub const KEYS_DIRECTORY_ENV: &str = "FEDMCP_KEYS_DIRECTORY";

pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory
        search_paths.push(PathBuf::from("./fedmcp.yaml"));
        search_paths.push(PathBuf::from("./fedmcp.yml"));
        search_paths.push(PathBuf::from("./fedmcp.toml"));

        // 2. User config directory
        let user_config = default_config_dir();
        search_paths.push(user_config.join("config.yaml"));
        search_paths.push(user_config.join("config.yml"));
        search_paths.push(user_config.join("config.toml"));

        Self { search_paths }
    }

    /// Create a config loader with custom search paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// The file `load_config` would read, if any.
    pub fn resolve_path(&self, config_file: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_file {
            Some(path.to_path_buf())
        } else if let Ok(env_config) = env::var(CONFIG_ENV) {
            Some(PathBuf::from(env_config))
        } else {
            self.find_config_file()
        }
    }

    /// Load configuration from the specified file or auto-discover.
    ///
    /// An explicitly named file must exist. When nothing is named and no
    /// file is found, defaults are used. Environment overrides are applied
    /// and the result is validated either way.
    pub fn load_config(&self, config_file: Option<&Path>) -> Result<FedmcpConfig, ConfigError> {
        let explicit = config_file.is_some() || env::var_os(CONFIG_ENV).is_some();

        let mut config = match self.resolve_path(config_file) {
            Some(path) if path.exists() => self.load_config_from_file(&path)?,
            Some(path) if explicit => return Err(ConfigError::ConfigNotFound { path }),
            _ => {
                tracing::debug!("No configuration file found, using defaults");
                FedmcpConfig::default()
            }
        };

        apply_env_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_config_from_file(&self, path: &Path) -> Result<FedmcpConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        // Apply environment variable substitution
        let substituted_content = self.substitute_env_vars(&content)?;

        // Parse based on file extension
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") | None => {
                serde_yaml::from_str::<FedmcpConfig>(&substituted_content)?
            }
            Some("toml") => toml::from_str::<FedmcpConfig>(&substituted_content)?,
            Some(ext) => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: ext.to_string(),
                })
            }
        };

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Find the first existing configuration file in search paths
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|path| path.is_file())
            .cloned()
    }

    /// Substitute environment variables in configuration content
    fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        // ${VAR}, ${VAR:-default}, ${VAR:?error}
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::EnvSubstitutionError(e.to_string()))?;

        let mut result = String::with_capacity(content.len());
        let mut last = 0;
        for cap in re.captures_iter(content) {
            let (Some(full_match), Some(var_expr)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            result.push_str(&content[last..full_match.start()]);
            result.push_str(&self.process_var_expression(var_expr.as_str())?);
            last = full_match.end();
        }
        result.push_str(&content[last..]);

        Ok(result)
    }

    /// Process a variable expression like "VAR", "VAR:-default", or "VAR:?error"
    fn process_var_expression(&self, expr: &str) -> Result<String, ConfigError> {
        if let Some((var_name, default_value)) = expr.split_once(":-") {
            Ok(env::var(var_name).unwrap_or_else(|_| default_value.to_string()))
        } else if let Some((var_name, error_msg)) = expr.split_once(":?") {
            env::var(var_name).map_err(|_| {
                ConfigError::EnvSubstitutionError(format!(
                    "Required environment variable '{}' is not set: {}",
                    var_name, error_msg
                ))
            })
        } else {
            env::var(expr).map_err(|_| {
                ConfigError::EnvSubstitutionError(format!(
                    "Required environment variable '{}' is not set",
                    expr
                ))
            })
        }
    }

    /// Get all search paths for debugging
    pub fn get_search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_env_overrides(config: &mut FedmcpConfig) {
    if let Ok(server) = env::var(DEFAULT_SERVER_ENV) {
        config.default_server = server;
    }
    if let Ok(workspace) = env::var(DEFAULT_WORKSPACE_ENV) {
        config.default_workspace = Some(workspace);
    }
    if let Ok(keys_directory) = env::var(KEYS_DIRECTORY_ENV) {
        config.keys_directory = PathBuf::from(keys_directory);
    }
}
