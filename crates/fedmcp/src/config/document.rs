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

//! Editing configuration files as written.
//!
//! [`ConfigLoader`](super::ConfigLoader) expands `${VAR}` references and
//! applies `FEDMCP_*` overrides. A [`ConfigDocument`] works on the file's own
//! tree instead: entries that are not edited, placeholders included, are
//! written back as they were read, and defaults the file never named are not
//! added.

use crate::config::ConfigError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
}

/// A configuration file's contents before substitution and overrides.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    format: Format,
    root: Value,
}

impl ConfigDocument {
    /// Read `path` as written. A file that does not exist yet is an empty
    /// document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") | None => Format::Yaml,
            Some("toml") => Format::Toml,
            Some(ext) => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: ext.to_string(),
                })
            }
        };

        let root = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
                path: path.to_path_buf(),
                source,
            })?;
            match format {
                Format::Yaml => serde_yaml::from_str::<Option<Value>>(&content)?
                    .unwrap_or_else(|| Value::Object(Map::new())),
                Format::Toml => toml::from_str::<Value>(&content)?,
            }
        } else {
            Value::Object(Map::new())
        };

        if !root.is_object() {
            return Err(ConfigError::InvalidValue {
                key: path.display().to_string(),
                reason: "top level must be a mapping".to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            format,
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The value stored at a dotted key, if the file names it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, part| node.get(part))
    }

    /// Set a dotted key such as `client.timeout_secs`.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let path: Vec<&str> = key.split('.').collect();
        self.set_path(&path, value)
    }

    /// Set the entry at `path`, creating intermediate tables as needed.
    pub fn set_path(&mut self, path: &[&str], value: Value) -> Result<(), ConfigError> {
        if insert_at(&mut self.root, path, value) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key: path.join("."),
                reason: "a parent entry is not a table".to_string(),
            })
        }
    }

    /// Write the document back to the file it was loaded from.
    pub fn save(&self) -> Result<(), ConfigError> {
        let content = match self.format {
            Format::Yaml => serde_yaml::to_string(&self.root)?,
            Format::Toml => toml::to_string_pretty(&self.root)?,
        };

        let write_err = |source| ConfigError::WriteError {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, content).map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), "Updated configuration file");
        Ok(())
    }
}

fn insert_at(node: &mut Value, path: &[&str], value: Value) -> bool {
    let (Value::Object(map), Some((first, rest))) = (node, path.split_first()) else {
        return false;
    };
    if rest.is_empty() {
        map.insert(first.to_string(), value);
        return true;
    }
    let child = map
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    insert_at(child, rest, value)
}
