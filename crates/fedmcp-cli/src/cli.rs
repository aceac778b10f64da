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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fedmcp",
    version,
    about = "FedMCP CLI - Manage compliance artifacts for government ML deployments",
    long_about = "Create, sign, verify and push FedMCP compliance artifacts (SSP fragments, POA&M templates, agent recipes, baseline modules, audit scripts)"
)]
pub struct Cli {
    /// Config file (default: ./fedmcp.yaml or $HOME/.fedmcp/config.yaml)
    #[arg(long, global = true, env = "FEDMCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new artifact from a content file
    Create {
        /// Artifact type (ssp-fragment, poam-template, agent-recipe, baseline-module, audit-script)
        artifact_type: String,

        /// Artifact name
        #[arg(short, long)]
        name: String,

        /// File holding the artifact content
        #[arg(short, long)]
        file: PathBuf,

        /// Metadata entries
        #[arg(short, long = "metadata", value_name = "KEY=VALUE")]
        metadata: Vec<String>,

        /// Where to write the artifact record
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sign an artifact (re-signs an already signed record)
    Sign {
        /// Artifact or signed artifact record
        artifact_file: PathBuf,

        /// Path to a PEM signing key
        #[arg(long, conflicts_with = "kms_key_id")]
        key_file: Option<PathBuf>,

        /// KMS key identifier
        #[arg(long)]
        kms_key_id: Option<String>,

        /// Workspace supplying the key source
        #[arg(short, long)]
        workspace: Option<String>,

        /// Signature validity window (e.g. "90d", "12h")
        #[arg(long)]
        valid_for: Option<String>,

        /// Where to write the signed record (default: <artifact>.signed.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a signed artifact against the trust store
    Verify {
        /// Signed artifact record
        #[arg(required_unless_present = "artifact_id")]
        artifact_file: Option<PathBuf>,

        /// Fetch the artifact from a server instead of a file
        #[arg(long, conflicts_with = "artifact_file")]
        artifact_id: Option<String>,

        /// FedMCP server URL (with --artifact-id)
        #[arg(long)]
        server: Option<String>,

        /// Workspace whose server to fetch from (with --artifact-id)
        #[arg(short, long)]
        workspace: Option<String>,

        /// Trust store file (default from config)
        #[arg(long)]
        trust_store: Option<PathBuf>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Push a signed artifact to a FedMCP server
    Push {
        /// Signed artifact record
        artifact_file: PathBuf,

        /// FedMCP server URL
        #[arg(long)]
        server: Option<String>,

        /// Workspace whose server to push to
        #[arg(short, long)]
        workspace: Option<String>,

        /// Tags to apply (sent with the record, not signed)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Manage FedMCP configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Manage signing keys
    #[command(subcommand)]
    Keys(KeysCommands),

    /// Manage the trust store
    #[command(subcommand)]
    Trust(TrustCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value (e.g. default_server, client.retry.max_attempts)
    Set { key: String, value: String },

    /// Add or replace a workspace
    AddWorkspace {
        name: String,

        /// Server URL for this workspace
        #[arg(long)]
        server: String,

        /// Local PEM signing key
        #[arg(long, conflicts_with = "kms_key_id")]
        key_file: Option<PathBuf>,

        /// KMS key identifier
        #[arg(long)]
        kms_key_id: Option<String>,

        /// Make this the default workspace
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
pub enum KeysCommands {
    /// Generate a new P-256 signing key
    Generate {
        /// Key name (file becomes <name>.pem in the keys directory)
        #[arg(short, long, default_value = "default")]
        name: String,

        /// Also trust the new key in the local trust store
        #[arg(long)]
        trust: bool,
    },

    /// Print the key id and public key of a local or KMS signing key
    Show {
        /// Path to a PEM signing key
        #[arg(long, conflicts_with = "kms_key_id")]
        key_file: Option<PathBuf>,

        /// KMS key identifier
        #[arg(long)]
        kms_key_id: Option<String>,

        /// Workspace supplying the key source
        #[arg(short, long)]
        workspace: Option<String>,

        /// Also write the public key PEM to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TrustCommands {
    /// Trust a PEM public key
    Add {
        /// Public key PEM file
        public_key_file: PathBuf,

        /// Key id to trust the key under, such as a KMS key ARN
        /// (default: the key's SHA-256 fingerprint)
        #[arg(long)]
        key_id: Option<String>,

        /// Stop trusting the key after this time (RFC 3339)
        #[arg(long)]
        until: Option<String>,
    },

    /// List trusted keys
    List,

    /// Revoke a trusted key
    Revoke { key_id: String },
}
