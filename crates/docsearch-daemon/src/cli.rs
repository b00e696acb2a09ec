//! CLI argument parsing for docsearch.
//!
//! CLI flags override every other configuration source.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use url::Url;

/// Document search over an embedded index
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/docsearch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override index directory
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index one document
    Index(IndexArgs),

    /// Print the locators of documents matching a filter query
    Find {
        /// Filter query, e.g. "contents LIKE '*Winterfell*'"
        query: String,

        /// Map results to <endpoint>/<id> instead of a stored locator
        #[arg(long)]
        retrieve_endpoint: Option<String>,
    },

    /// Print the index query a filter query translates to
    Translate {
        /// Filter query
        query: String,
    },
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// 32-character alphanumeric document id
    #[arg(long)]
    pub id: String,

    /// Read content from a local file
    #[arg(long, conflicts_with = "location", required_unless_present = "location")]
    pub file: Option<String>,

    /// Read content from a file:// or http(s):// locator
    #[arg(long)]
    pub location: Option<Url>,

    /// Media type of the content (application/json selects CST extraction)
    #[arg(long)]
    pub media_type: Option<String>,

    #[arg(long)]
    pub resource_location: Option<Url>,

    /// Defaults to the --file path when no other locator is given
    #[arg(long)]
    pub file_location: Option<Url>,

    #[arg(long)]
    pub irm_location: Option<Url>,

    #[arg(long)]
    pub metacard_location: Option<Url>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub country_code: Option<String>,

    #[arg(long)]
    pub keyword: Option<String>,

    #[arg(long)]
    pub icid: Option<String>,

    /// RFC 3339 timestamp
    #[arg(long)]
    pub created: Option<DateTime<Utc>>,

    #[arg(long)]
    pub modified: Option<DateTime<Utc>>,

    #[arg(long)]
    pub expiration: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "00067360b70e4acfab561fe593ad3f7a";

    #[test]
    fn test_cli_index_file() {
        let cli = Cli::parse_from(["docsearch", "index", "--id", ID, "--file", "/tmp/doc.txt"]);
        match cli.command {
            Commands::Index(args) => {
                assert_eq!(args.id, ID);
                assert_eq!(args.file.as_deref(), Some("/tmp/doc.txt"));
                assert!(args.location.is_none());
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn test_cli_index_location_with_attributes() {
        let cli = Cli::parse_from([
            "docsearch",
            "index",
            "--id",
            ID,
            "--location",
            "https://files.example/doc.json",
            "--media-type",
            "application/json",
            "--resource-location",
            "https://store.example/r/1",
            "--created",
            "2019-11-04T12:30:00Z",
        ]);
        match cli.command {
            Commands::Index(args) => {
                assert_eq!(
                    args.location.unwrap().as_str(),
                    "https://files.example/doc.json"
                );
                assert_eq!(args.media_type.as_deref(), Some("application/json"));
                assert!(args.resource_location.is_some());
                assert!(args.created.is_some());
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn test_cli_index_needs_content() {
        assert!(Cli::try_parse_from(["docsearch", "index", "--id", ID]).is_err());
        assert!(Cli::try_parse_from([
            "docsearch",
            "index",
            "--id",
            ID,
            "--file",
            "a",
            "--location",
            "file:///a"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_find() {
        let cli = Cli::parse_from(["docsearch", "find", "contents LIKE '*Winterfell*'"]);
        match cli.command {
            Commands::Find {
                query,
                retrieve_endpoint,
            } => {
                assert_eq!(query, "contents LIKE '*Winterfell*'");
                assert!(retrieve_endpoint.is_none());
            }
            _ => panic!("Expected Find command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "docsearch",
            "translate",
            "title = 'a'",
            "--config",
            "/path/to/config.toml",
            "--index-path",
            "/srv/index",
            "-l",
            "debug",
        ]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
        assert_eq!(cli.index_path, Some("/srv/index".to_string()));
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}
