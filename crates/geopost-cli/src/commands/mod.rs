//! Command implementations

mod config;
mod init;
mod post;
mod reconcile;
mod search;
mod status;
mod token;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use crate::storage;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    // Token issuing needs neither settings nor backends
    if let Commands::Token(args) = &cli.command {
        return token::execute(args, &output);
    }

    let settings = storage::load_settings(&cli)?;

    if matches!(cli.command, Commands::Config) {
        return config::execute(&settings, &output);
    }

    let backends = storage::connect(&cli, &settings, &output).await?;

    match &cli.command {
        Commands::Init => init::execute(&backends, &settings, &output).await,
        Commands::Post(args) => post::execute(args, &backends, &settings, &output).await,
        Commands::Search(args) => search::execute(args, &backends, &settings, &output).await,
        Commands::Reconcile(args) => reconcile::execute(args, &backends, &settings, &output).await,
        Commands::Status(args) => status::execute(args, &backends, &output).await,
        Commands::Token(_) | Commands::Config => Ok(()),
    }
}
