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

//! FedMCP CLI - create, sign, verify and push compliance artifacts.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands, KeysCommands, TrustCommands};
use commands::Context;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // `config init` must work before any valid configuration exists.
    if let Commands::Config(ConfigCommands::Init { force }) = &cli.command {
        return commands::config::init(cli.config.as_deref(), *force);
    }

    let ctx = Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Create {
            artifact_type,
            name,
            file,
            metadata,
            output,
        } => commands::create::run(&artifact_type, &name, &file, &metadata, output.as_deref())?,
        Commands::Sign {
            artifact_file,
            key_file,
            kms_key_id,
            workspace,
            valid_for,
            output,
        } => {
            let source = commands::KeySourceArgs {
                key_file,
                kms_key_id,
                workspace,
            };
            commands::sign::run(
                &ctx,
                &artifact_file,
                &source,
                valid_for.as_deref(),
                output.as_deref(),
            )
            .await?
        }
        Commands::Verify {
            artifact_file,
            artifact_id,
            server,
            workspace,
            trust_store,
            json,
        } => {
            let target = match (artifact_file, artifact_id) {
                (Some(path), _) => commands::verify::Target::File(path),
                (None, Some(id)) => commands::verify::Target::Remote {
                    artifact_id: id,
                    server,
                    workspace,
                },
                (None, None) => anyhow::bail!("Provide an artifact file or --artifact-id"),
            };
            commands::verify::run(&ctx, target, trust_store.as_deref(), json).await?
        }
        Commands::Push {
            artifact_file,
            server,
            workspace,
            tags,
        } => {
            commands::push::run(
                &ctx,
                &artifact_file,
                server.as_deref(),
                workspace.as_deref(),
                &tags,
            )
            .await?
        }
        Commands::Config(command) => match command {
            ConfigCommands::Show => commands::config::show(&ctx)?,
            ConfigCommands::Init { force } => commands::config::init(cli.config.as_deref(), force)?,
            ConfigCommands::Set { key, value } => commands::config::set(ctx, &key, &value)?,
            ConfigCommands::AddWorkspace {
                name,
                server,
                key_file,
                kms_key_id,
                default,
            } => commands::config::add_workspace(
                ctx, &name, &server, key_file, kms_key_id, default,
            )?,
        },
        Commands::Keys(command) => match command {
            KeysCommands::Generate { name, trust } => {
                commands::keys::generate(&ctx, &name, trust).await?
            }
            KeysCommands::Show {
                key_file,
                kms_key_id,
                workspace,
                output,
            } => {
                let source = commands::KeySourceArgs {
                    key_file,
                    kms_key_id,
                    workspace,
                };
                commands::keys::show(&ctx, &source, output.as_deref()).await?
            }
        },
        Commands::Trust(command) => match command {
            TrustCommands::Add {
                public_key_file,
                key_id,
                until,
            } => commands::trust::add(
                &ctx,
                &public_key_file,
                key_id.as_deref(),
                until.as_deref(),
            )?,
            TrustCommands::List => commands::trust::list(&ctx)?,
            TrustCommands::Revoke { key_id } => commands::trust::revoke(&ctx, &key_id)?,
        },
    }

    Ok(())
}
