//! holocron - caching aggregator for the Star Wars API

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;
mod swapi;

use cli::args::GlobalOptions;
use cli::{CacheCommands, Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    // RUST_LOG wins over --debug
    let default_filter = if debug { "warn,holocron=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match &cli.command {
        Commands::Init { force } => cli::init::run(&opts, *force),
        Commands::Status => cli::status::run(&opts).await,
        Commands::Version => {
            println!("holocron version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::People(cmd) => cli::collections::people(cmd, &opts).await,
        Commands::Films(cmd) => cli::collections::films(cmd, &opts).await,
        Commands::Starships(cmd) => cli::collections::starships(cmd, &opts).await,
        Commands::Counter => cli::counter::run(&opts).await,
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear => cli::cache::clear(&opts),
            CacheCommands::Path => cli::cache::path(&opts),
        },
    }
}
