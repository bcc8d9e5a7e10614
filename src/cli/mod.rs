//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod cache;
pub mod collections;
pub mod context;
pub mod counter;
pub mod handlers;
pub mod init;
pub mod status;

pub use args::OutputFormat;
pub use context::CommandContext;

/// holocron - caching aggregator for the Star Wars API
#[derive(Parser, Debug)]
#[command(name = "holocron")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "HOLOCRON_FORMAT",
        default_value = "table",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "HOLOCRON_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Upstream API root (e.g. https://swapi.dev/api/)
    #[arg(long, global = true, env = "SW_API_BASE_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Root for image URLs
    #[arg(long, global = true, env = "HOLOCRON_APP_URL", hide_env = true)]
    pub app_url: Option<String>,

    /// Bypass the raw response cache for this run
    #[arg(long, global = true, env = "HOLOCRON_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Use an in-process cache instead of the on-disk store
    #[arg(long, global = true, env = "HOLOCRON_MEMORY", hide_env = true)]
    pub memory: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "HOLOCRON_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and cache status
    Status,

    /// Display version information
    Version,

    /// Characters, with their starships and films
    #[command(subcommand)]
    People(EntityCommands),

    /// Films
    #[command(subcommand)]
    Films(EntityCommands),

    /// Starships
    #[command(subcommand)]
    Starships(EntityCommands),

    /// Show the cumulative upstream fetch count
    Counter,

    /// Manage the on-disk cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Subcommands shared by every collection
#[derive(Subcommand, Debug)]
pub enum EntityCommands {
    /// List the whole collection, across all upstream pages
    #[command(visible_alias = "ls")]
    List {
        /// Upstream search term
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Get one entity by numeric ID
    #[command(visible_alias = "g")]
    Get {
        /// Entity ID
        id: u32,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Remove every cache entry, including the fetch counter
    Clear,

    /// Print the cache directory
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_entity_get_requires_numeric_id() {
        assert!(Cli::try_parse_from(["holocron", "people", "get", "luke"]).is_err());
        assert!(Cli::try_parse_from(["holocron", "people", "get", "-1"]).is_err());

        let cli = Cli::try_parse_from(["holocron", "films", "get", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Films(EntityCommands::Get { id: 4 })
        ));
    }

    #[test]
    fn test_list_search_flag() {
        let cli =
            Cli::try_parse_from(["holocron", "starships", "ls", "--search", "wing"]).unwrap();
        match cli.command {
            Commands::Starships(EntityCommands::List { search }) => {
                assert_eq!(search.as_deref(), Some("wing"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
