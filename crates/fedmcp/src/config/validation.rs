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

use crate::config::{types::*, ValidationError};

/// Upper bound for `client.retry.max_delay_ms` (one hour).
pub const MAX_RETRY_DELAY_MS: u64 = 3_600_000;

/// Upper bound for `client.retry.multiplier`.
pub const MAX_RETRY_MULTIPLIER: f64 = 10.0;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Server URLs must be absolute http(s) URLs.
pub fn validate_server_url(url: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidServerUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = url::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(format!("unsupported scheme '{}'", scheme))),
    }
}

impl Validate for FedmcpConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = validate_server_url(&self.default_server) {
            errors.push(e);
        }
        for (key, workspace) in &self.workspaces {
            if &workspace.name != key {
                errors.push(ValidationError::WorkspaceNameMismatch {
                    key: key.clone(),
                    name: workspace.name.clone(),
                });
            }
            if let Err(e) = workspace.validate() {
                errors.push(e);
            }
            let uses_kms = workspace
                .key
                .as_ref()
                .is_some_and(|key| key.kind == KeySourceKind::Kms);
            if uses_kms && self.kms.is_none() {
                errors.push(ValidationError::InvalidKeySource {
                    workspace: key.clone(),
                    reason: "kms key source requires a [kms] endpoint".to_string(),
                });
            }
        }
        if let Some(default) = &self.default_workspace {
            if !self.workspaces.contains_key(default) {
                errors.push(ValidationError::UnknownDefaultWorkspace(default.clone()));
            }
        }
        if let Some(kms) = &self.kms {
            if let Err(e) = kms.validate() {
                errors.push(e);
            }
        }
        if let Err(e) = self.client.validate() {
            errors.push(e);
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple { errors }),
        }
    }
}

impl Validate for WorkspaceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_server_url(&self.server)?;

        if let Some(key) = &self.key {
            let invalid = |reason: &str| ValidationError::InvalidKeySource {
                workspace: self.name.clone(),
                reason: reason.to_string(),
            };
            match key.kind {
                KeySourceKind::Local => {
                    if key.path.is_none() {
                        return Err(invalid("local key source requires 'path'"));
                    }
                    if key.kms_key_id.is_some() {
                        return Err(invalid("local key source must not set 'kms_key_id'"));
                    }
                }
                KeySourceKind::Kms => {
                    if key.kms_key_id.as_deref().map_or(true, str::is_empty) {
                        return Err(invalid("kms key source requires 'kms_key_id'"));
                    }
                    if key.path.is_some() {
                        return Err(invalid("kms key source must not set 'path'"));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Validate for KmsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_server_url(&self.endpoint)
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout {
                timeout: self.timeout_secs,
            });
        }
        self.retry.validate()
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=10).contains(&self.max_attempts) {
            return Err(ValidationError::InvalidRetryAttempts {
                attempts: self.max_attempts,
            });
        }
        let invalid = |reason: String| ValidationError::InvalidRetryBackoff { reason };
        if self.max_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(invalid(format!(
                "max_delay_ms {} exceeds {}",
                self.max_delay_ms, MAX_RETRY_DELAY_MS
            )));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(invalid(format!(
                "initial_delay_ms {} exceeds max_delay_ms {}",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        if !(1.0..=MAX_RETRY_MULTIPLIER).contains(&self.multiplier) {
            return Err(invalid(format!(
                "multiplier {} must be between 1 and {}",
                self.multiplier, MAX_RETRY_MULTIPLIER
            )));
        }
        Ok(())
    }
}
