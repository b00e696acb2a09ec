//! docsearch
//!
//! Index documents and find them again with filter queries.
//!
//! # Usage
//!
//! ```bash
//! docsearch index --id <ID> (--file PATH | --location URL) [--resource-location URL ...]
//! docsearch find "contents LIKE '*Winterfell*'"
//! docsearch translate "title = 'North' AND created AFTER 2019-01-01T00:00:00Z"
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/docsearch/config.toml)
//! 3. Environment variables (DOCSEARCH_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use docsearch_daemon::{
    handle_find, handle_index, handle_translate, init_logging, load_settings, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.index_path.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Index(args) => {
            handle_index(&settings, args).await?;
        }
        Commands::Find {
            query,
            retrieve_endpoint,
        } => {
            handle_find(&settings, &query, retrieve_endpoint).await?;
        }
        Commands::Translate { query } => {
            handle_translate(&settings, &query)?;
        }
    }

    Ok(())
}
