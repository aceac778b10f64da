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

use crate::config::types::*;
use std::path::PathBuf;

pub const DEFAULT_SERVER: &str = "https://fedmcp.agency.gov";

/// `$HOME/.fedmcp`, or `./.fedmcp` when there is no home directory.
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".fedmcp"))
        .unwrap_or_else(|| PathBuf::from(".fedmcp"))
}

impl Default for FedmcpConfig {
    fn default() -> Self {
        let config_dir = default_config_dir();
        Self {
            default_server: DEFAULT_SERVER.to_string(),
            default_workspace: None,
            workspaces: Default::default(),
            keys_directory: config_dir.join("keys"),
            trust_store: config_dir.join("trust-store.json"),
            kms: None,
            client: ClientConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            token_env: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

/// Generate a complete default configuration as a YAML string
pub fn generate_default_config_yaml() -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&FedmcpConfig::default())
}
